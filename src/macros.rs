//! Accessor macros for navigating `serde_cbor_2::Value` trees without
//! panicking on attacker-controlled input.

macro_rules! cbor_try_map {
    ($v:expr) => {
        match $v {
            serde_cbor_2::Value::Map(m) => Ok(m),
            _ => Err($crate::error::WebauthnError::MalformedStructure("cbor map")),
        }
    };
}

macro_rules! cbor_try_array {
    ($v:expr) => {
        match $v {
            serde_cbor_2::Value::Array(a) => Ok(a),
            _ => Err($crate::error::WebauthnError::MalformedStructure(
                "cbor array",
            )),
        }
    };
}

macro_rules! cbor_try_bytes {
    ($v:expr) => {
        match $v {
            serde_cbor_2::Value::Bytes(b) => Ok(b),
            _ => Err($crate::error::WebauthnError::MalformedStructure(
                "cbor bytes",
            )),
        }
    };
}

macro_rules! cbor_try_string {
    ($v:expr) => {
        match $v {
            serde_cbor_2::Value::Text(t) => Ok(t.clone()),
            _ => Err($crate::error::WebauthnError::MalformedStructure(
                "cbor text",
            )),
        }
    };
}

macro_rules! cbor_try_i128 {
    ($v:expr) => {
        match $v {
            serde_cbor_2::Value::Integer(i) => Ok(*i),
            _ => Err($crate::error::WebauthnError::MalformedStructure(
                "cbor integer",
            )),
        }
    };
}
