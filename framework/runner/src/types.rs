/// Recommended error type for the suite `main` function and any shared code that scenario handlers
/// use. This type is compatible with the [crate::definition::HookResult] type so you can use `?` to
/// propagate errors.
pub type LoadTestResult<T> = anyhow::Result<T>;
