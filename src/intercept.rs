use serde_json::{Map, Value};

/// Walk depth cap; payloads nested deeper than this are abandoned.
const MAX_WALK_DEPTH: usize = 32;

/// Keys commonly used for result arrays in API payloads. Only the first
/// present list-valued key of a node is descended into.
const RESULT_ARRAY_KEYS: &[&str] = &["jobs", "results", "data", "items", "listings", "hits"];

fn is_job_like(map: &Map<String, Value>) -> bool {
    (map.contains_key("company_name") || map.contains_key("companyName"))
        && (map.contains_key("title") || map.contains_key("name"))
}

/// Scan one network response body. Non-200 or non-JSON responses are
/// ignored, as is anything that fails to parse; a single bad response must
/// never abort the session.
pub fn scan_response(status: u32, mime_type: &str, body: &str, sink: &mut Vec<Map<String, Value>>) {
    if status != 200 {
        return;
    }
    if !mime_type.contains("json") {
        return;
    }
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return;
    };
    collect_job_objects(&payload, sink);
}

/// Find job-like objects in an arbitrarily nested JSON payload.
///
/// Explicit worklist instead of recursion so adversarially deep payloads
/// cannot blow the stack. Children are pushed in reverse so captures keep
/// document order.
pub fn collect_job_objects(root: &Value, sink: &mut Vec<Map<String, Value>>) {
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_WALK_DEPTH {
            continue;
        }
        match node {
            Value::Object(map) => {
                if is_job_like(map) {
                    sink.push(map.clone());
                    continue;
                }
                if let Some(arr) = RESULT_ARRAY_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_array))
                {
                    for item in arr.iter().rev() {
                        stack.push((item, depth + 1));
                    }
                    continue;
                }
                for value in map.values().rev() {
                    if value.is_object() || value.is_array() {
                        stack.push((value, depth + 1));
                    }
                }
            }
            Value::Array(arr) => {
                for item in arr.iter().rev() {
                    stack.push((item, depth + 1));
                }
            }
            _ => {}
        }
    }
}

// ── Tests ──
