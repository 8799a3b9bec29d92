//! Test helpers and format-level tests for the TIFF reader

mod byte_order_tests;
