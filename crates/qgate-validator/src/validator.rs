//! The ordered validation pipeline.

use qgate_core::{
    CandidateQuery, Catalog, LimitsConfig, Rejection, ValidationVerdict, ValidatorConfig,
};
use tracing::debug;

use crate::lexer::{significant, tokenize};
use crate::stages::{
    AnalyzedQuery, KeywordDenylist, LimitEnforcement, ObjectScope, QueryCheck, RowLimits,
    StatementShape,
};

/// Validates candidate SQL against a catalog snapshot.
///
/// Holds no mutable state; one instance can serve concurrent callers. The
/// catalog is passed per call so the verdict records exactly which version
/// it was checked against.
pub struct QueryValidator {
    limits: LimitsConfig,
    stages: Vec<Box<dyn QueryCheck>>,
}

impl QueryValidator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self::with_config(limits, &ValidatorConfig::default())
    }

    pub fn with_config(limits: LimitsConfig, config: &ValidatorConfig) -> Self {
        let stages: Vec<Box<dyn QueryCheck>> = vec![
            Box::new(StatementShape),
            Box::new(ObjectScope),
            Box::new(KeywordDenylist::with_extra(
                &config.extra_forbidden_keywords,
                &config.extra_forbidden_functions,
            )),
            Box::new(LimitEnforcement),
        ];
        Self { limits, stages }
    }

    pub fn limits(&self) -> LimitsConfig {
        self.limits
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage and produce a verdict. Never panics on bad input.
    pub fn validate(&self, candidate: &CandidateQuery, catalog: &Catalog) -> ValidationVerdict {
        let version = catalog.schema_version.to_string();
        let reject = |rejection: Rejection| {
            debug!(kind = %rejection.kind, reason = %rejection.reason, "candidate rejected");
            ValidationVerdict::reject(rejection, version.clone(), candidate.source)
        };

        let sql = strip_code_fence(&candidate.sql);
        let tokens = match tokenize(sql) {
            Ok(tokens) => significant(&tokens),
            Err(e) => return reject(Rejection::not_a_select(e.to_string())),
        };

        let mut query = AnalyzedQuery {
            sql,
            tokens,
            catalog,
            limits: RowLimits::new(self.limits, candidate.requested_limit),
            statement: None,
            rewrite: None,
        };

        for stage in &self.stages {
            if let Err(rejection) = stage.check(&mut query) {
                debug!(stage = stage.name(), "validation stage failed");
                return reject(rejection);
            }
        }

        match query.rewrite {
            Some(rewrite) => {
                debug!(row_ceiling = rewrite.row_ceiling, "candidate accepted");
                ValidationVerdict::accept(
                    rewrite.sql,
                    rewrite.row_ceiling,
                    version.clone(),
                    candidate.source,
                )
            }
            None => reject(Rejection::not_a_select("no executable statement produced")),
        }
    }
}

/// Remove a surrounding markdown code fence (```sql ... ```), if present.
pub fn strip_code_fence(sql: &str) -> &str {
    let trimmed = sql.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return sql;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return sql;
    };

    match body.split_once('\n') {
        Some((info, code)) if is_fence_language(info) => code.trim(),
        _ => body.trim(),
    }
}

fn is_fence_language(info: &str) -> bool {
    let info = info.trim();
    info.is_empty()
        || ["sql", "postgresql", "postgres", "pgsql", "psql"]
            .iter()
            .any(|lang| info.eq_ignore_ascii_case(lang))
}
