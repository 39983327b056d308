//! Macros for building query parameters.

/// Build a [`Params`](crate::Params) map from `name => value` pairs.
///
/// Names may be given with or without the leading `:` of the placeholder.
///
/// # Examples
///
/// ```
/// use namesake::{params, Value};
///
/// let params = params! { "id" => 10, ":title" => "hello" };
/// assert_eq!(params.get("id"), Some(&Value::Int(10)));
/// assert_eq!(params.get("title"), Some(&Value::Text("hello".into())));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $(
            params.insert($name, $value);
        )+
        params
    }};
}
