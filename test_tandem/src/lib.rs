//! System tests for the tandem producers live under `tests/`.
