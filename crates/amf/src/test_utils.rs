/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(TRACE)` - uses specified level
macro_rules! init_test_tracing {
    () => {
        $crate::test_utils::init_test_tracing!(DEBUG)
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

pub(crate) use init_test_tracing;
