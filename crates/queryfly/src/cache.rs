//! Cache keys for builder state.

use crate::builder::Builder;
use crate::error::Result;

/// Returns a lowercase hex MD5 digest identifying the builder's query.
///
/// The digest covers wheres, columns, groups, orders, offset, limit and the
/// aggregate, in that order. The collection, cursor options and flags such as
/// `distinct` do not contribute.
pub fn generate_cache_key(builder: &Builder) -> Result<String> {
    let key = (
        builder.get_wheres(),
        builder.get_columns(),
        builder.get_groups(),
        builder.get_orders(),
        builder.get_offset(),
        builder.get_limit(),
        builder.get_aggregate(),
    );
    let serialized = serde_json::to_string(&key)?;
    Ok(format!("{:x}", md5::compute(serialized.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Builder {
        let mut builder = Builder::new("users");
        builder
            .where_("age", ">=", 18)
            .select(["name"])
            .order_asc("name")
            .limit(10);
        builder
    }

    #[test]
    fn key_is_hex_md5() {
        let key = generate_cache_key(&sample()).unwrap();
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identical_state_gives_identical_key() {
        assert_eq!(
            generate_cache_key(&sample()).unwrap(),
            generate_cache_key(&sample()).unwrap()
        );
    }

    #[test]
    fn unrelated_fields_do_not_change_key() {
        let base = generate_cache_key(&sample()).unwrap();

        let mut other = sample();
        other.from("people").timeout(5).hint("idx").distinct();
        assert_eq!(generate_cache_key(&other).unwrap(), base);
    }

    #[test]
    fn nested_group_keys_on_its_wheres_only() {
        let key = |configure: fn(&mut Builder)| {
            let mut builder = sample();
            builder.where_nested(configure);
            generate_cache_key(&builder).unwrap()
        };

        let plain = key(|q| {
            q.where_("a", "=", 1);
        });
        let decorated = key(|q| {
            q.where_("a", "=", 1)
                .from("elsewhere")
                .timeout(3)
                .hint("idx")
                .distinct()
                .limit(4);
        });
        let different = key(|q| {
            q.where_("a", "=", 2);
        });

        assert_eq!(plain, decorated);
        assert_ne!(plain, different);
    }

    #[test]
    fn each_keyed_field_changes_key() {
        let base = generate_cache_key(&sample()).unwrap();
        let mutations: Vec<fn(&mut Builder)> = vec![
            |b| {
                b.where_("x", "=", 1);
            },
            |b| {
                b.add_select(["age"]);
            },
            |b| {
                b.group_by(["role"]);
            },
            |b| {
                b.order_desc("age");
            },
            |b| {
                b.offset(5);
            },
            |b| {
                b.limit(11);
            },
            |b| {
                b.aggregate("count", ["*"]);
            },
        ];
        for mutate in mutations {
            let mut changed = sample();
            mutate(&mut changed);
            assert_ne!(generate_cache_key(&changed).unwrap(), base);
        }
    }
}
