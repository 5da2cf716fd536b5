//! Property-based tests for the order fill/state-machine invariants (§3,
//! §4.1). Mirrors the teacher's `core/fixed_point_proptest.rs`: unit tests
//! pin specific examples, this file checks the invariants hold across
//! thousands of randomized fill sequences.
