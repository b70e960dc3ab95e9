//! SQL statement generation from query transforms
//!
//! ```text
//! SELECT <projections | *> FROM <table>
//!   [WHERE <filter> AND ... AND <sample predicate>]
//!   [GROUP BY <non-aggregated projections>]
//!   [LIMIT <row> [OFFSET <offset>]]
//! ```

use super::Writer;
use crate::accumulator::{OutputBundle, QueryTransform};
use crate::naming;
use crate::spec::{AggregateOp, RenderContext};
use crate::{Result, VislayerError};

/// Writes the query statement of a layer
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlWriter;

impl SqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Writer for SqlWriter {
    type Output = String;

    fn write(&self, ctx: &RenderContext<'_>, bundle: &OutputBundle) -> Result<String> {
        self.validate(bundle)?;
        Ok(build_query(ctx.table_name, &bundle.query_transforms))
    }

    fn validate(&self, bundle: &OutputBundle) -> Result<()> {
        let samples = bundle
            .query_transforms
            .iter()
            .filter(|t| matches!(t, QueryTransform::Sample { .. }))
            .count();
        let limits = bundle
            .query_transforms
            .iter()
            .filter(|t| matches!(t, QueryTransform::Limit { .. }))
            .count();
        if samples > 1 || limits > 1 {
            return Err(VislayerError::WriterError(format!(
                "A layer query takes at most one sample and one limit step, got {} and {}",
                samples, limits
            )));
        }
        Ok(())
    }
}

/// Quote a column identifier
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Hash threshold keeping about `limit` of `size` rows, or None when every
/// row is kept
pub fn sample_threshold(size: u64, limit: u64) -> Option<u64> {
    if size == 0 || limit >= size {
        return None;
    }
    let fraction = limit as f64 / size as f64;
    Some((fraction * naming::SAMPLE_HASH_MODULUS as f64).floor() as u64)
}

fn sample_predicate(threshold: u64) -> String {
    format!(
        "MOD({} * {}, {}) < {}",
        naming::ROWID_COLUMN,
        naming::SAMPLE_HASH_MULTIPLIER,
        naming::SAMPLE_HASH_MODULUS,
        threshold
    )
}

fn projection(expr: &str, alias: Option<&str>, aggregate: Option<AggregateOp>) -> String {
    let column = match aggregate {
        Some(op) => format!("{}({})", op.sql_function(), quote_ident(expr)),
        None => quote_ident(expr),
    };
    match alias {
        Some(alias) if aggregate.is_some() || alias != expr => {
            format!("{} AS {}", column, quote_ident(alias))
        }
        _ => column,
    }
}

/// Build the statement for a table and an ordered list of steps
pub fn build_query(table: &str, steps: &[QueryTransform]) -> String {
    let mut select: Vec<String> = Vec::new();
    let mut group_by: Vec<String> = Vec::new();
    let mut aggregated = false;
    let mut predicates: Vec<String> = Vec::new();
    let mut sample: Option<String> = None;
    let mut limit: Option<String> = None;

    for step in steps {
        match step {
            QueryTransform::Project {
                expr,
                alias,
                aggregate,
            } => {
                let column = projection(expr, alias.as_deref(), *aggregate);
                // Channels bound to the same column share one projection
                if select.contains(&column) {
                    continue;
                }
                select.push(column);
                match aggregate {
                    Some(_) => aggregated = true,
                    None => group_by.push(quote_ident(expr)),
                }
            }
            QueryTransform::Filter { expr } => predicates.push(format!("({})", expr)),
            QueryTransform::Sample { size, limit } => {
                sample = sample_threshold(*size, *limit).map(sample_predicate);
            }
            QueryTransform::Limit { row, offset } => {
                limit = Some(match offset {
                    Some(offset) => format!("LIMIT {} OFFSET {}", row, offset),
                    None => format!("LIMIT {}", row),
                });
            }
        }
    }
    predicates.extend(sample);

    let mut sql = if select.is_empty() {
        format!("SELECT * FROM {}", table)
    } else {
        format!("SELECT {} FROM {}", select.join(", "), table)
    };
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    if aggregated && !group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by.join(", "));
    }
    if let Some(limit) = limit {
        sql.push(' ');
        sql.push_str(&limit);
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_star() {
        assert_eq!(build_query("t", &[]), "SELECT * FROM t");
        assert_eq!(
            build_query(
                "t",
                &[QueryTransform::Limit {
                    row: 5,
                    offset: Some(10)
                }]
            ),
            "SELECT * FROM t LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_projections_deduplicated() {
        let sql = build_query(
            "grid",
            &[
                QueryTransform::project("lon"),
                QueryTransform::project("lat"),
                QueryTransform::project("lon"),
            ],
        );
        assert_eq!(sql, r#"SELECT "lon", "lat" FROM grid"#);
    }

    #[test]
    fn test_aggregate_groups_by_plain_columns() {
        let sql = build_query(
            "obs",
            &[
                QueryTransform::project("station"),
                QueryTransform::Project {
                    expr: "ws".to_string(),
                    alias: Some("avg_ws".to_string()),
                    aggregate: Some(AggregateOp::Avg),
                },
            ],
        );
        assert_eq!(
            sql,
            r#"SELECT "station", AVG("ws") AS "avg_ws" FROM obs GROUP BY "station""#
        );
    }

    #[test]
    fn test_filters_and_sample_are_anded() {
        let sql = build_query(
            "obs",
            &[
                QueryTransform::Filter {
                    expr: "t2m > 0".to_string(),
                },
                QueryTransform::Sample {
                    size: 4,
                    limit: 1,
                },
                QueryTransform::Filter {
                    expr: "lat < 60".to_string(),
                },
            ],
        );
        assert_eq!(
            sql,
            "SELECT * FROM obs WHERE (t2m > 0) AND (lat < 60) AND MOD(rowid * 265445761, 4294967296) < 1073741824"
        );
    }

    #[test]
    fn test_sample_threshold() {
        assert_eq!(sample_threshold(1000, 1000), None);
        assert_eq!(sample_threshold(1000, 5000), None);
        assert_eq!(sample_threshold(0, 10), None);
        assert_eq!(sample_threshold(2, 1), Some(2_147_483_648));
        assert_eq!(sample_threshold(10, 0), Some(0));
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
    }
}
