//! Handler tests: classification, materialization and the facade.

mod dump_tests;
mod materializer_tests;
