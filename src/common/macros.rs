#[macro_export]
macro_rules! log_err {
    // Usage: log_err!(err, params);
    ($err:expr, $params:expr) => {{
        let location = format!("{}:{}", file!(), line!());

        let params_json = ::serde_json::to_value($params)
            .unwrap_or(::serde_json::Value::Null);

        ::log::error!(
            target: "sapphire_trails::errors",
            "{} failed: {} params={}",
            location,
            $err,
            params_json
        );
    }};
}
