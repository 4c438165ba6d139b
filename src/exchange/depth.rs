use bigdecimal::BigDecimal;
use reqwest::StatusCode;
use serde_json::Value;

use crate::{exchange::markets::parse_decimal, types::PriceResolution};

/// Maps a raw depth response onto a [`PriceResolution`].
///
/// 422 means the market is inactive or invalid, which is an expected quiet
/// state. Every other failure is transient and must not trigger fallback.
pub fn classify_depth_response(status: StatusCode, body: &[u8]) -> PriceResolution {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return PriceResolution::Unavailable;
    }

    if !status.is_success() {
        return PriceResolution::TransientError(format!("depth endpoint returned HTTP {}", status));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => best_ask_from_depth(&value),
        Err(e) => PriceResolution::TransientError(format!("undecodable depth body: {}", e)),
    }
}

pub fn best_ask_from_depth(body: &Value) -> PriceResolution {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return PriceResolution::Unavailable;
    }

    let result = match body.get("result") {
        Some(result) if !result.is_null() => result,
        _ => return PriceResolution::Unavailable,
    };

    let asks = match result.get("ask") {
        None | Some(Value::Null) => return PriceResolution::Unavailable,
        Some(Value::Array(asks)) => asks,
        Some(_) => {
            return PriceResolution::TransientError("ask side is not a list".to_string());
        }
    };

    let best_ask = match asks.first() {
        Some(level) => level,
        None => return PriceResolution::Unavailable,
    };

    match best_ask.get("price").and_then(parse_decimal) {
        Some(price) if price > BigDecimal::from(0) => PriceResolution::Precise(price),
        Some(price) => PriceResolution::TransientError(format!("non-positive best ask {}", price)),
        None => PriceResolution::TransientError("unparsable best ask price".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_non_empty_ask_list_is_precise() {
        let payload = body(json!({
            "success": true,
            "result": {
                "ask": [
                    {"price": "28000", "quantity": "12.5"},
                    {"price": "28100", "quantity": "3"}
                ],
                "bid": []
            }
        }));

        assert_eq!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::Precise(BigDecimal::from_str("28000").unwrap())
        );
    }

    #[test]
    fn test_empty_ask_list_is_unavailable() {
        let payload = body(json!({"success": true, "result": {"ask": [], "bid": []}}));
        assert_eq!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::Unavailable
        );

        let payload = body(json!({"success": true, "result": {"bid": []}}));
        assert_eq!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::Unavailable
        );
    }

    #[test]
    fn test_unsuccessful_envelope_is_unavailable() {
        let payload = body(json!({"success": false, "message": "market disabled"}));
        assert_eq!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::Unavailable
        );
    }

    #[test]
    fn test_unprocessable_status_is_unavailable() {
        assert_eq!(
            classify_depth_response(StatusCode::UNPROCESSABLE_ENTITY, b"{}"),
            PriceResolution::Unavailable
        );
    }

    #[test]
    fn test_other_statuses_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::NOT_FOUND,
            StatusCode::BAD_GATEWAY,
        ] {
            assert!(matches!(
                classify_depth_response(status, b"{}"),
                PriceResolution::TransientError(_)
            ));
        }
    }

    #[test]
    fn test_garbage_body_is_transient() {
        assert!(matches!(
            classify_depth_response(StatusCode::OK, b"<html>oops</html>"),
            PriceResolution::TransientError(_)
        ));

        let payload = body(json!({"success": true, "result": {"ask": [{"price": "n/a"}]}}));
        assert!(matches!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::TransientError(_)
        ));
    }

    #[test]
    fn test_extreme_exponent_best_ask_is_transient() {
        let payload = body(json!({
            "success": true,
            "result": {"ask": [{"price": "1e-20000000", "quantity": "1"}]}
        }));

        assert!(matches!(
            classify_depth_response(StatusCode::OK, &payload),
            PriceResolution::TransientError(_)
        ));
    }
}
