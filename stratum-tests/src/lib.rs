//! Integration tests for the stratum workspace live in `tests/`.
