//! Resource layer tests.

mod resolver_tests;
