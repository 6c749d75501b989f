//! 중첩 JSON 평탄화
//!
//! 객체는 `parent.key`, 배열은 `parent[index]` 경로로 펼쳐 검색하기 쉬운
//! 보조 표현을 만듭니다. 깊이와 키 개수 상한을 넘으면 에러 대신 잘린 결과를 반환합니다.

use serde_json::{Map, Value};

/// 기본 최대 깊이
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// 기본 최대 키 수
pub const DEFAULT_MAX_KEYS: usize = 5000;

/// 최상위가 스칼라일 때 사용하는 키
pub const SCALAR_KEY: &str = "value";

/// 평탄화 상한
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// 최대 깊이. 초과하는 서브트리는 `<max_depth:N>` 문자열로 대체됩니다.
    pub max_depth: usize,
    /// 최대 리프 수. 도달하면 순회를 멈춥니다.
    pub max_keys: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

/// 값을 경로 → 스칼라 매핑으로 평탄화합니다.
pub fn flatten(value: &Value, opts: FlattenOptions) -> Map<String, Value> {
    let opts = FlattenOptions {
        max_depth: if opts.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            opts.max_depth
        },
        max_keys: if opts.max_keys == 0 {
            DEFAULT_MAX_KEYS
        } else {
            opts.max_keys
        },
    };

    let mut out = Map::new();
    flatten_into(&mut out, "", value, 0, &opts);
    out
}

fn flatten_into(
    out: &mut Map<String, Value>,
    prefix: &str,
    value: &Value,
    depth: usize,
    opts: &FlattenOptions,
) {
    if out.len() >= opts.max_keys {
        return;
    }
    if depth > opts.max_depth {
        if !prefix.is_empty() {
            out.insert(
                prefix.to_owned(),
                Value::String(format!("<max_depth:{}>", opts.max_depth)),
            );
        }
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, &path, child, depth + 1, opts);
                if out.len() >= opts.max_keys {
                    return;
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = if prefix.is_empty() {
                    i.to_string()
                } else {
                    format!("{prefix}[{i}]")
                };
                flatten_into(out, &path, child, depth + 1, opts);
                if out.len() >= opts.max_keys {
                    return;
                }
            }
        }
        scalar => {
            let key = if prefix.is_empty() { SCALAR_KEY } else { prefix };
            out.insert(key.to_owned(), scalar.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_and_arrays() {
        let v = json!({
            "host": "web-1",
            "labels": {"env": "prod", "tier": {"name": "edge"}},
            "ports": [80, 443],
            "ok": true,
            "note": null
        });
        let flat = flatten(&v, FlattenOptions::default());
        assert_eq!(flat["host"], json!("web-1"));
        assert_eq!(flat["labels.env"], json!("prod"));
        assert_eq!(flat["labels.tier.name"], json!("edge"));
        assert_eq!(flat["ports[0]"], json!(80));
        assert_eq!(flat["ports[1]"], json!(443));
        assert_eq!(flat["ok"], json!(true));
        assert_eq!(flat["note"], Value::Null);
        assert_eq!(flat.len(), 7);
    }

    #[test]
    fn top_level_scalar_uses_value_key() {
        let flat = flatten(&json!("boom"), FlattenOptions::default());
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[SCALAR_KEY], json!("boom"));
    }

    #[test]
    fn top_level_array_uses_bare_indices() {
        let flat = flatten(&json!([{"a": 1}, 2]), FlattenOptions::default());
        assert_eq!(flat["0.a"], json!(1));
        assert_eq!(flat["1"], json!(2));
    }

    #[test]
    fn empty_containers_produce_no_leaves() {
        assert!(flatten(&json!({}), FlattenOptions::default()).is_empty());
        assert!(flatten(&json!({"a": []}), FlattenOptions::default()).is_empty());
    }

    #[test]
    fn depth_limit_inserts_placeholder() {
        let v = json!({"a": {"b": {"c": {"d": 1}}}});
        let opts = FlattenOptions {
            max_depth: 2,
            max_keys: 100,
        };
        let flat = flatten(&v, opts);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a.b.c"], json!("<max_depth:2>"));
    }

    #[test]
    fn key_limit_returns_partial_result() {
        let items: Vec<i32> = (0..50).collect();
        let opts = FlattenOptions {
            max_depth: 16,
            max_keys: 10,
        };
        let flat = flatten(&json!({ "items": items }), opts);
        assert_eq!(flat.len(), 10);
        assert!(flat.contains_key("items[0]"));
        assert!(!flat.contains_key("items[10]"));
    }

    #[test]
    fn zero_options_fall_back_to_defaults() {
        let opts = FlattenOptions {
            max_depth: 0,
            max_keys: 0,
        };
        let flat = flatten(&json!({"a": {"b": 1}}), opts);
        assert_eq!(flat["a.b"], json!(1));
    }
}
