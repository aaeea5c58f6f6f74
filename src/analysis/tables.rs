//! Analysis stages, each rendered as one CSV table

use super::Dataset;
use crate::{
    error::{AppError, Result},
    stats::{self, Comparison, Summary},
    store::CsvTable,
    types::{ApiType, Metric, QueryType},
};

/// Label of the scope pooling every query type
pub const OVERALL_SCOPE: &str = "overall";

/// A stage table plus the number of groups it had to skip
#[derive(Debug, Clone, PartialEq)]
pub struct StageTable {
    pub table: CsvTable,
    pub skipped: usize,
}

/// Number cell: shortest round-trip form, empty when undefined
pub fn number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

fn flag(value: bool) -> String {
    value.to_string()
}

/// Per `(api, query, metric)` count and location; zero-success groups get an empty row
pub fn descriptive(dataset: &Dataset) -> CsvTable {
    let mut table = CsvTable::new(&["api_type", "query_type", "metric", "count", "mean", "std", "min", "median", "max"]);

    for api in ApiType::ALL {
        for query in dataset.query_types() {
            for metric in Metric::ALL {
                let values = dataset.values(api, query, metric);
                let mut row = vec![api.to_string(), query.to_string(), metric.to_string()];
                match Summary::from_values(&values) {
                    Some(s) => row.extend([
                        s.count.to_string(),
                        number(s.mean),
                        optional(s.std),
                        number(s.min),
                        number(s.median),
                        number(s.max),
                    ]),
                    None => row.extend(["0".to_string(), String::new(), String::new(), String::new(), String::new(), String::new()]),
                }
                table.push_row(row);
            }
        }
    }

    table
}

/// Shapiro-Wilk per group; groups below three successes are skipped
pub fn normality(dataset: &Dataset, alpha: f64) -> Result<StageTable> {
    let mut table = CsvTable::new(&["api_type", "query_type", "metric", "statistic", "p_value", "is_normal"]);
    let mut skipped = 0;

    for api in ApiType::ALL {
        for query in dataset.query_types() {
            for metric in Metric::ALL {
                let values = dataset.values(api, query, metric);
                let outcome = match stats::shapiro_wilk(&values) {
                    Ok(outcome) => outcome,
                    Err(AppError::InsufficientSample { .. }) => {
                        skipped += 1;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                table.push_row(vec![
                    api.to_string(),
                    query.to_string(),
                    metric.to_string(),
                    number(outcome.statistic),
                    number(outcome.p_value),
                    flag(outcome.exceeds(alpha)),
                ]);
            }
        }
    }

    Ok(StageTable { table, skipped })
}

/// Levene per `(query, metric)`, REST against GraphQL
pub fn homogeneity(dataset: &Dataset, alpha: f64) -> Result<StageTable> {
    let mut table = CsvTable::new(&["query_type", "metric", "statistic", "p_value", "is_homogeneous"]);
    let mut skipped = 0;

    for query in dataset.query_types() {
        for metric in Metric::ALL {
            let rest = dataset.values(ApiType::Rest, query, metric);
            let graphql = dataset.values(ApiType::GraphQl, query, metric);
            if rest.is_empty() || graphql.is_empty() {
                skipped += 1;
                continue;
            }

            let outcome = stats::levene(&[&rest, &graphql])?;
            table.push_row(vec![
                query.to_string(),
                metric.to_string(),
                number(outcome.statistic),
                number(outcome.p_value),
                flag(outcome.exceeds(alpha)),
            ]);
        }
    }

    Ok(StageTable { table, skipped })
}

/// Hypothesis table of one research question plus its pooled comparison
#[derive(Debug, Clone)]
pub struct QuestionTable {
    pub table: CsvTable,
    pub skipped: usize,
    pub overall: Option<Comparison>,
}

/// Comparisons over the pooled scope first, then each query type.
/// Scopes with an empty side are omitted.
pub fn research_question(dataset: &Dataset, metric: Metric, alpha: f64) -> Result<QuestionTable> {
    let with_reduction = metric == Metric::ResponseSize;

    let mut header = vec![
        "scope", "n_rest", "n_graphql", "rest_mean", "rest_std", "graphql_mean", "graphql_std", "difference",
    ];
    if with_reduction {
        header.push("reduction_percent");
    }
    header.extend(["t_statistic", "t_pvalue", "u_statistic", "u_pvalue", "cohens_d", "significant"]);
    let mut table = CsvTable::new(header.as_slice());

    let mut scopes: Vec<(String, Vec<f64>, Vec<f64>)> = vec![(
        OVERALL_SCOPE.to_string(),
        dataset.pooled(ApiType::Rest, metric),
        dataset.pooled(ApiType::GraphQl, metric),
    )];
    scopes.extend(dataset.query_types().map(|query: QueryType| {
        (
            query.to_string(),
            dataset.values(ApiType::Rest, query, metric),
            dataset.values(ApiType::GraphQl, query, metric),
        )
    }));

    let mut overall = None;
    let mut skipped = 0;
    for (scope, rest, graphql) in scopes {
        if rest.is_empty() || graphql.is_empty() {
            skipped += 1;
            continue;
        }

        let c = Comparison::compute(&rest, &graphql, alpha)?;
        let mut row = vec![
            scope.clone(),
            c.n_a.to_string(),
            c.n_b.to_string(),
            number(c.mean_a),
            number(c.std_a),
            number(c.mean_b),
            number(c.std_b),
            number(c.difference),
        ];
        if with_reduction {
            row.push(number(c.reduction_percent));
        }
        row.extend([
            number(c.t_test.statistic),
            number(c.t_test.p_value),
            number(c.mann_whitney.statistic),
            number(c.mann_whitney.p_value),
            number(c.cohens_d),
            flag(c.significant),
        ]);
        table.push_row(row);

        if scope == OVERALL_SCOPE {
            overall = Some(c);
        }
    }

    Ok(QuestionTable { table, skipped, overall })
}

/// Two-way ANOVA table of one metric; empty when there is nothing to fit
pub fn anova(dataset: &Dataset, metric: Metric) -> Result<CsvTable> {
    let mut table = CsvTable::new(&["term", "sum_sq", "df", "F", "PR(>F)"]);

    let observations = dataset.observations(metric);
    let fitted = match stats::two_way_anova(&observations, "api_type", "query_type") {
        Ok(fitted) => fitted,
        Err(AppError::InsufficientSample { .. }) => return Ok(table),
        Err(e) => return Err(e),
    };

    for row in fitted.rows {
        table.push_row(vec![row.term, number(row.sum_sq), number(row.df), number(row.f), number(row.p_value)]);
    }
    Ok(table)
}

/// Plot-ready group means with their 95% half-widths
pub fn group_aggregates(dataset: &Dataset, metric: Metric) -> CsvTable {
    let mut table = CsvTable::new(&["api_type", "query_type", "count", "mean", "ci95_half_width"]);

    for query in dataset.query_types() {
        for api in ApiType::ALL {
            let values = dataset.values(api, query, metric);
            let row = match Summary::from_values(&values) {
                Some(s) => vec![
                    api.to_string(),
                    query.to_string(),
                    s.count.to_string(),
                    number(s.mean),
                    optional(s.ci95_half_width()),
                ],
                None => vec![api.to_string(), query.to_string(), "0".to_string(), String::new(), String::new()],
            };
            table.push_row(row);
        }
    }

    table
}
