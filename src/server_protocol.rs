use serde_json::Value;

#[derive(Debug)]
pub enum ParsedClientMessage {
    /// Raw key code as captured by the browser; mapped later by `InputMapper`.
    Key {
        code: String,
    },
    NewGame {
        rows: Option<i64>,
        cols: Option<i64>,
    },
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "key" => {
            let code = object.get("code")?.as_str()?.to_string();
            Some(ParsedClientMessage::Key { code })
        }
        "new_game" => {
            let rows = parse_optional_i64(object.get("rows"))?;
            let cols = parse_optional_i64(object.get("cols"))?;
            Some(ParsedClientMessage::NewGame { rows, cols })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}
