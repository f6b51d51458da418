//! Unit tests for error.rs
//!
//! Tests the Error variants, their trait implementations and the
//! error-building macros.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_capacity_exceeded_display() {
    let err = Error::CapacityExceeded("instance count 1000 reached".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Capacity exceeded"));
    assert!(display.contains("instance count 1000"));
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("geometry 7 not found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("geometry 7"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("skinning not initialized".to_string());
    assert_eq!(
        format!("{}", err),
        "Initialization failed: skinning not initialized"
    );
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::CapacityExceeded("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_names_variant() {
    assert!(format!("{:?}", Error::CapacityExceeded("a".into())).contains("CapacityExceeded"));
    assert!(format!("{:?}", Error::InvalidResource("b".into())).contains("InvalidResource"));
    assert!(format!("{:?}", Error::InitializationFailed("c".into())).contains("InitializationFailed"));
}

#[test]
fn test_error_clone_keeps_message() {
    let err = Error::InvalidResource("lod distance".to_string());
    let copy = err.clone();
    assert_eq!(format!("{}", err), format!("{}", copy));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
fn test_engine_err_builds_invalid_resource() {
    let err = crate::engine_err!("galaxy3d::Test", "bad id {}", 42);
    match err {
        Error::InvalidResource(msg) => assert_eq!(msg, "bad id 42"),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_engine_capacity_err_builds_capacity_exceeded() {
    let err = crate::engine_capacity_err!("galaxy3d::Test", "{} > {}", 5, 4);
    assert!(matches!(err, Error::CapacityExceeded(ref msg) if msg == "5 > 4"));
}

#[test]
fn test_engine_init_err_builds_initialization_failed() {
    let err = crate::engine_init_err!("galaxy3d::Test", "not ready");
    assert!(matches!(err, Error::InitializationFailed(_)));
}

#[test]
fn test_engine_bail_returns_early() {
    fn check(value: u32) -> Result<u32> {
        if value > 10 {
            crate::engine_bail!("galaxy3d::Test", "value {} too large", value);
        }
        Ok(value * 2)
    }

    assert_eq!(check(3).unwrap(), 6);
    let err = check(11).unwrap_err();
    assert!(format!("{}", err).contains("value 11 too large"));
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::CapacityExceeded("full".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert!(outer().is_err());
}
