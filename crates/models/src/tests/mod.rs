/// Relational mapping tests against a private in-memory SQLite database
pub mod crud_tests;
