//! The individual validation stages.
//!
//! Each stage inspects an [`AnalyzedQuery`] and either passes it on or
//! returns a [`Rejection`]. Stages run in a fixed order; the first rejection
//! wins. The final stage produces the normalized SQL.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use qgate_core::{Catalog, LimitsConfig, Rejection};
use sqlparser::ast::{
    Ident, ObjectName, ObjectNamePart, Query, SetExpr, Statement, TableFactor, Visit, Visitor,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::lexer::{Token, TokenKind};

/// Statement keywords that never belong in a read-only query.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    // data modification
    "insert", "update", "delete", "merge", "truncate", "copy", "returning", "into",
    // schema changes
    "create", "alter", "drop", "rename", "attach", "detach", "refresh", "reindex", "cluster",
    "vacuum", "analyze",
    // privileges
    "grant", "revoke", "reassign",
    // transaction and session control
    "begin", "commit", "rollback", "savepoint", "release", "abort", "set", "reset", "discard",
    "lock",
    // procedural and administrative commands
    "do", "call", "execute", "prepare", "deallocate", "listen", "notify", "unlisten", "load",
    "checkpoint", "import",
];

/// Functions with side effects, server file access, or that run SQL given
/// as a string.
pub const FORBIDDEN_FUNCTIONS: &[&str] = &[
    "pg_sleep",
    "pg_sleep_for",
    "pg_sleep_until",
    "pg_terminate_backend",
    "pg_cancel_backend",
    "pg_reload_conf",
    "pg_rotate_logfile",
    "pg_promote",
    "pg_switch_wal",
    "pg_create_restore_point",
    "pg_backup_start",
    "pg_backup_stop",
    "pg_logical_emit_message",
    "pg_notify",
    "pg_read_file",
    "pg_read_binary_file",
    "pg_ls_dir",
    "pg_ls_logdir",
    "pg_ls_waldir",
    "pg_stat_file",
    "pg_advisory_lock",
    "pg_advisory_xact_lock",
    "pg_try_advisory_lock",
    "pg_try_advisory_xact_lock",
    "lo_import",
    "lo_export",
    "lo_unlink",
    "lo_from_bytea",
    "lo_put",
    "set_config",
    "nextval",
    "setval",
    "dblink",
    "dblink_exec",
    "dblink_connect",
    "query_to_xml",
    "query_to_xml_and_xmlschema",
    "cursor_to_xml",
    "table_to_xml",
    "schema_to_xml",
    "database_to_xml",
];

/// Row-count bounds for one validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLimits {
    pub default_rows: u64,
    pub max_rows: u64,
    pub requested: Option<u64>,
}

impl RowLimits {
    pub fn new(limits: LimitsConfig, requested: Option<u64>) -> Self {
        Self {
            default_rows: limits.default_rows,
            max_rows: limits.max_rows,
            requested,
        }
    }

    /// Largest limit a query may keep.
    pub fn cap(&self) -> u64 {
        self.requested.map_or(self.max_rows, |r| r.min(self.max_rows))
    }

    /// Limit appended to a query that has none.
    pub fn implicit(&self) -> u64 {
        self.requested.unwrap_or(self.default_rows).min(self.max_rows)
    }
}

/// The rewritten statement produced by [`LimitEnforcement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub sql: String,
    pub row_ceiling: u64,
}

/// A candidate as seen by the stages.
#[derive(Debug)]
pub struct AnalyzedQuery<'a> {
    /// Candidate text with any markdown fence removed.
    pub sql: &'a str,
    /// Tokens without whitespace and comments.
    pub tokens: Vec<Token<'a>>,
    pub catalog: &'a Catalog,
    pub limits: RowLimits,
    /// The parsed query, once [`StatementShape`] has accepted it.
    pub statement: Option<Statement>,
    pub rewrite: Option<Rewrite>,
}

/// Parse `sql` as exactly one query statement.
fn parse_query(sql: &str) -> Result<Statement, Rejection> {
    let mut parsed = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map_err(|e| Rejection::not_a_select(format!("query does not parse: {}", e)))?;
    if parsed.len() != 1 {
        return Err(Rejection::not_a_select(format!(
            "expected exactly one statement, found {}",
            parsed.len()
        )));
    }
    match parsed.pop() {
        Some(statement @ Statement::Query(_)) => Ok(statement),
        _ => Err(Rejection::not_a_select("statement is not a query")),
    }
}

/// One step of the validation pipeline.
pub trait QueryCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, query: &mut AnalyzedQuery<'_>) -> Result<(), Rejection>;
}

// ---------------------------------------------------------------------------
// Statement shape
// ---------------------------------------------------------------------------

/// Exactly one statement, and that statement is a plain SELECT.
#[derive(Debug, Default)]
pub struct StatementShape;

impl QueryCheck for StatementShape {
    fn name(&self) -> &'static str {
        "statement_shape"
    }

    fn check(&self, query: &mut AnalyzedQuery<'_>) -> Result<(), Rejection> {
        let Some(first) = query.tokens.first() else {
            return Err(Rejection::not_a_select("query is empty"));
        };

        let mut statements = 0usize;
        let mut current_has_content = false;
        for token in &query.tokens {
            if token.kind == TokenKind::Semicolon {
                if current_has_content {
                    statements += 1;
                }
                current_has_content = false;
            } else {
                current_has_content = true;
            }
        }
        if current_has_content {
            statements += 1;
        }
        if statements > 1 {
            return Err(Rejection::not_a_select(format!(
                "expected exactly one statement, found {}",
                statements
            )));
        }

        if !first.is_keyword("select") {
            return Err(Rejection::not_a_select(format!(
                "only SELECT statements are allowed, query starts with '{}'",
                first.text
            )));
        }

        query.statement = Some(parse_query(query.sql)?);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object scope
// ---------------------------------------------------------------------------

/// Every referenced relation must be a catalog view in the safe schema (or a
/// CTE visible at the point of reference).
#[derive(Debug, Default)]
pub struct ObjectScope;

/// A relation named in a FROM list, a JOIN or a `TABLE` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Name parts after identifier case folding.
    pub parts: Vec<String>,
    /// The name as written.
    pub text: String,
    /// Resolves to a CTE in scope rather than a stored relation.
    pub cte: bool,
}

/// Collects relations while tracking which CTE names each subquery can see.
///
/// A non-recursive CTE body sees only the CTEs defined before it; the
/// statement body and `WITH RECURSIVE` bodies see all of them.
#[derive(Debug, Default)]
struct RelationCollector {
    relations: Vec<RelationRef>,
    scopes: Vec<Vec<String>>,
    cte_bodies: HashMap<*const Query, Vec<String>>,
}

/// Unquoted identifiers fold to lower case.
fn fold(ident: &Ident) -> String {
    if ident.quote_style.is_some() {
        ident.value.clone()
    } else {
        ident.value.to_lowercase()
    }
}

impl RelationCollector {
    fn visible(&self) -> &[String] {
        self.scopes.last().map(Vec::as_slice).unwrap_or_default()
    }

    fn record(&mut self, parts: Vec<String>, text: String) {
        let cte = matches!(parts.as_slice(), [name] if self.visible().contains(name));
        self.relations.push(RelationRef { parts, text, cte });
    }

    fn record_name(&mut self, name: &ObjectName) {
        let parts = name
            .0
            .iter()
            .map(|part| match part {
                ObjectNamePart::Identifier(ident) => fold(ident),
                // never matches a catalog view
                other => other.to_string(),
            })
            .collect();
        self.record(parts, name.to_string());
    }

    /// `TABLE name` forms reachable through set operations.
    fn record_table_commands(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Table(table) => {
                // quote style is not kept here, names compare as written
                let parts: Vec<String> = table
                    .schema_name
                    .iter()
                    .chain(table.table_name.iter())
                    .cloned()
                    .collect();
                let text = parts.join(".");
                self.record(parts, text);
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.record_table_commands(left);
                self.record_table_commands(right);
            }
            _ => {}
        }
    }
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        let key: *const Query = query;
        let mut visible = match self.cte_bodies.remove(&key) {
            Some(visible) => visible,
            None => self.visible().to_vec(),
        };

        if let Some(with) = &query.with {
            let outer = visible.clone();
            let names: Vec<String> = with
                .cte_tables
                .iter()
                .map(|cte| fold(&cte.alias.name))
                .collect();
            for (i, cte) in with.cte_tables.iter().enumerate() {
                let defined = if with.recursive { &names[..] } else { &names[..i] };
                let mut body_scope = outer.clone();
                body_scope.extend(defined.iter().cloned());
                let body: *const Query = &*cte.query;
                self.cte_bodies.insert(body, body_scope);
            }
            visible.extend(names);
        }

        self.scopes.push(visible);
        self.record_table_commands(&query.body);
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.scopes.pop();
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<Self::Break> {
        // a name with arguments is a set-returning function
        if let TableFactor::Table { name, args: None, .. } = factor {
            self.record_name(name);
        }
        ControlFlow::Continue(())
    }
}

impl ObjectScope {
    /// Relations referenced anywhere in the statement, in visiting order.
    pub fn relations(statement: &Statement) -> Vec<RelationRef> {
        let mut collector = RelationCollector::default();
        let _ = statement.visit(&mut collector);
        collector.relations
    }
}

impl QueryCheck for ObjectScope {
    fn name(&self) -> &'static str {
        "object_scope"
    }

    fn check(&self, query: &mut AnalyzedQuery<'_>) -> Result<(), Rejection> {
        let catalog = query.catalog;
        let parsed;
        let statement = match &query.statement {
            Some(statement) => statement,
            None => {
                parsed = parse_query(query.sql)?;
                &parsed
            }
        };

        for relation in Self::relations(statement) {
            if relation.cte {
                continue;
            }
            let allowed = match relation.parts.as_slice() {
                [name] => catalog.contains_relation(None, name),
                [schema, name] => catalog.contains_relation(Some(schema.as_str()), name),
                _ => false,
            };
            if !allowed {
                return Err(Rejection::unauthorized_object(format!(
                    "relation '{}' is not in the catalog; only views in schema '{}' may be queried",
                    relation.text, catalog.safe_schema
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Keyword denylist
// ---------------------------------------------------------------------------

/// Rejects write/DDL/admin keywords, locking clauses and dangerous functions.
#[derive(Debug)]
pub struct KeywordDenylist {
    keywords: HashSet<String>,
    functions: HashSet<String>,
}

impl Default for KeywordDenylist {
    fn default() -> Self {
        Self::with_extra(&[], &[])
    }
}

impl KeywordDenylist {
    pub fn with_extra(keywords: &[String], functions: &[String]) -> Self {
        Self {
            keywords: FORBIDDEN_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .chain(keywords.iter().map(|k| k.to_lowercase()))
                .collect(),
            functions: FORBIDDEN_FUNCTIONS
                .iter()
                .map(|f| f.to_string())
                .chain(functions.iter().map(|f| f.to_lowercase()))
                .collect(),
        }
    }
}

impl QueryCheck for KeywordDenylist {
    fn name(&self) -> &'static str {
        "keyword_denylist"
    }

    fn check(&self, query: &mut AnalyzedQuery<'_>) -> Result<(), Rejection> {
        let tokens = &query.tokens;
        for (i, token) in tokens.iter().enumerate() {
            let next = tokens.get(i + 1);
            let called = next.is_some_and(|t| t.kind == TokenKind::LParen);

            if called
                && let Some(name) = token.identifier()
                && self.functions.contains(&name)
            {
                return Err(Rejection::forbidden_keyword(format!(
                    "function '{}' is not allowed",
                    name
                )));
            }

            if token.kind != TokenKind::Word {
                continue;
            }
            let word = token.text.to_lowercase();
            if self.keywords.contains(&word) {
                return Err(Rejection::forbidden_keyword(format!(
                    "keyword '{}' is not allowed",
                    word.to_uppercase()
                )));
            }
            if word == "for"
                && next.is_some_and(|t| {
                    t.is_keyword("update") || t.is_keyword("share") || t.is_keyword("no") || t.is_keyword("key")
                })
            {
                return Err(Rejection::forbidden_keyword("locking clauses are not allowed"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Limit enforcement
// ---------------------------------------------------------------------------

/// Guarantees an explicit row ceiling no larger than the configured maximum.
#[derive(Debug, Default)]
pub struct LimitEnforcement;

/// How the top-level statement currently bounds its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowClause {
    /// `LIMIT <value>`; indices of the value tokens (may be empty).
    Limit { keyword: usize, value: (usize, usize) },
    /// `FETCH FIRST|NEXT [<count>] ROW|ROWS ONLY|WITH TIES`; `ties` spans
    /// the `WITH TIES` tokens.
    Fetch {
        keyword: usize,
        count: (usize, usize),
        ties: Option<(usize, usize)>,
    },
    None,
}

impl LimitEnforcement {
    fn find_clause(tokens: &[Token<'_>]) -> RowClause {
        let mut depth = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Word if depth == 0 => {
                    if token.is_keyword("limit") {
                        let end = Self::top_level_until(tokens, i + 1, &["offset", "fetch", "for"]);
                        return RowClause::Limit {
                            keyword: i,
                            value: (i + 1, end),
                        };
                    }
                    if token.is_keyword("fetch") {
                        let start = i + 2;
                        let end = Self::top_level_until(tokens, start, &["row", "rows"]);
                        let ties = (tokens.get(end + 1).is_some_and(|t| t.is_keyword("with"))
                            && tokens.get(end + 2).is_some_and(|t| t.is_keyword("ties")))
                        .then_some((end + 1, end + 3));
                        return RowClause::Fetch {
                            keyword: i,
                            count: (start.min(end), end),
                            ties,
                        };
                    }
                }
                _ => {}
            }
        }
        RowClause::None
    }

    /// First index at or after `from` holding a top-level stop word or `;`.
    fn top_level_until(tokens: &[Token<'_>], from: usize, stop: &[&str]) -> usize {
        let mut depth = 0usize;
        for (offset, token) in tokens.iter().enumerate().skip(from) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Semicolon if depth == 0 => return offset,
                TokenKind::Word if depth == 0 && stop.iter().any(|s| token.is_keyword(s)) => {
                    return offset;
                }
                _ => {}
            }
        }
        tokens.len()
    }

    /// Apply non-overlapping byte-range edits to `sql[start..end]`.
    fn apply(sql: &str, (start, end): (usize, usize), mut edits: Vec<Edit>) -> String {
        edits.sort_by_key(|e| e.from);
        let mut out = String::with_capacity(end - start + 16);
        let mut at = start;
        for edit in edits {
            out.push_str(&sql[at..edit.from]);
            out.push_str(&edit.text);
            at = edit.to;
        }
        out.push_str(&sql[at..end]);
        out
    }

    /// A single integer literal, if that is all the span holds.
    fn literal(tokens: &[Token<'_>], (start, end): (usize, usize)) -> Option<u64> {
        match &tokens[start..end] {
            [token] if token.kind == TokenKind::Number => token.text.parse().ok(),
            _ => None,
        }
    }
}

/// Replace `sql[from..to]` with `text`.
#[derive(Debug)]
struct Edit {
    from: usize,
    to: usize,
    text: String,
}

impl QueryCheck for LimitEnforcement {
    fn name(&self) -> &'static str {
        "limit_enforcement"
    }

    fn check(&self, query: &mut AnalyzedQuery<'_>) -> Result<(), Rejection> {
        let tokens = &query.tokens;
        let Some(last) = tokens.iter().rposition(|t| t.kind != TokenKind::Semicolon) else {
            return Err(Rejection::not_a_select("query is empty"));
        };
        let body = (tokens[0].start, tokens[last].end);
        let sql = query.sql;
        let cap = query.limits.cap();

        // Replace a span of tokens with the cap, or insert it after `anchor`
        // when the span is empty.
        let set_count = |span: (usize, usize), anchor: usize| -> Edit {
            if span.0 < span.1 {
                Edit {
                    from: tokens[span.0].start,
                    to: tokens[span.1 - 1].end,
                    text: cap.to_string(),
                }
            } else {
                let at = tokens[anchor].end;
                Edit {
                    from: at,
                    to: at,
                    text: format!(" {}", cap),
                }
            }
        };

        let (edits, row_ceiling) = match Self::find_clause(tokens) {
            RowClause::Limit { keyword, value } => match Self::literal(tokens, value) {
                Some(n) if n <= cap => (vec![], n),
                _ => (vec![set_count(value, keyword)], cap),
            },
            RowClause::Fetch {
                keyword,
                count,
                ties,
            } => {
                let mut edits = Vec::new();
                let ceiling = if count.0 >= count.1 {
                    // FETCH FIRST ROW
                    1.min(cap)
                } else {
                    match Self::literal(tokens, count) {
                        Some(n) if n <= cap => n,
                        _ => {
                            edits.push(set_count(count, keyword + 1));
                            cap
                        }
                    }
                };
                // WITH TIES may return more rows than the count
                if let Some((from, to)) = ties {
                    edits.push(Edit {
                        from: tokens[from].start,
                        to: tokens[to - 1].end,
                        text: "ONLY".to_string(),
                    });
                }
                (edits, ceiling)
            }
            RowClause::None => {
                let implicit = query.limits.implicit();
                let at = body.1;
                let edit = Edit {
                    from: at,
                    to: at,
                    text: format!(" LIMIT {}", implicit),
                };
                (vec![edit], implicit)
            }
        };

        let rewrite = Rewrite {
            sql: Self::apply(sql, body, edits),
            row_ceiling,
        };

        query.rewrite = Some(rewrite);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{significant, tokenize};
    use pretty_assertions::assert_eq;

    fn toks(sql: &str) -> Vec<Token<'_>> {
        significant(&tokenize(sql).unwrap())
    }

    fn relations(sql: &str) -> Vec<RelationRef> {
        ObjectScope::relations(&parse_query(sql).unwrap())
    }

    /// Relations that must resolve to stored objects.
    fn stored(sql: &str) -> Vec<String> {
        relations(sql)
            .into_iter()
            .filter(|r| !r.cte)
            .map(|r| r.text)
            .collect()
    }

    #[test]
    fn test_relations_in_from_and_join() {
        assert_eq!(
            stored("SELECT * FROM a JOIN s.b ON a.id = b.id, c LEFT JOIN \"D\" USING (x)"),
            vec!["a", "s.b", "c", "\"D\""]
        );
    }

    #[test]
    fn test_relation_names_are_case_folded() {
        let parts: Vec<_> = relations("SELECT * FROM Gateway_Safe.CANDIDATES, \"Mixed\"")
            .into_iter()
            .map(|r| r.parts)
            .collect();
        assert_eq!(
            parts,
            vec![
                vec!["gateway_safe".to_string(), "candidates".to_string()],
                vec!["Mixed".to_string()],
            ]
        );
    }

    #[test]
    fn test_relations_in_subqueries() {
        assert_eq!(
            stored("SELECT * FROM (SELECT id FROM inner_t) x WHERE id IN (SELECT id FROM other)"),
            vec!["inner_t", "other"]
        );
        assert_eq!(
            stored("SELECT (SELECT max(id) FROM scalar_t), id FROM t WHERE EXISTS (SELECT 1 FROM e)"),
            vec!["scalar_t", "t", "e"]
        );
    }

    #[test]
    fn test_relations_in_parenthesized_joins() {
        assert_eq!(
            stored("SELECT * FROM (employees_raw e JOIN candidates_safe c ON true)"),
            vec!["employees_raw", "candidates_safe"]
        );
        assert_eq!(
            stored("SELECT * FROM ((a CROSS JOIN b) JOIN c ON true)"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_from_inside_functions_is_not_a_relation() {
        assert!(stored("SELECT EXTRACT(YEAR FROM hired_at), SUBSTRING(name FROM 2)").is_empty());
        assert_eq!(
            stored("SELECT a FROM t WHERE a IS DISTINCT FROM b"),
            vec!["t"]
        );
    }

    #[test]
    fn test_table_functions_are_skipped() {
        assert_eq!(
            stored("SELECT * FROM generate_series(1, 3) g, LATERAL unnest(ARRAY[1, 2]) u"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_cte_references_are_marked() {
        assert_eq!(
            stored("WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM a, b, c"),
            vec!["c"]
        );
    }

    #[test]
    fn test_nested_cte_is_scoped_to_its_subquery() {
        let found = relations("SELECT * FROM pg_user, (WITH pg_user AS (SELECT 1) SELECT * FROM pg_user) x");
        let flags: Vec<_> = found.iter().map(|r| (r.text.as_str(), r.cte)).collect();
        assert_eq!(flags, vec![("pg_user", false), ("pg_user", true)]);
    }

    #[test]
    fn test_cte_body_does_not_see_itself_or_later_ctes() {
        assert_eq!(
            stored("SELECT * FROM (WITH pg_user AS (SELECT * FROM pg_user) SELECT * FROM pg_user) x"),
            vec!["pg_user"]
        );
        assert_eq!(
            stored("SELECT * FROM (WITH a AS (SELECT * FROM b), b AS (SELECT 1) SELECT * FROM a) x"),
            vec!["b"]
        );
    }

    #[test]
    fn test_recursive_cte_sees_itself() {
        assert!(
            stored("WITH RECURSIVE t (n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM t) SELECT * FROM t")
                .is_empty()
        );
    }

    #[test]
    fn test_fetch_with_ties_is_located() {
        let tokens = toks("SELECT a FROM t ORDER BY a FETCH FIRST 5 ROWS WITH TIES");
        match LimitEnforcement::find_clause(&tokens) {
            RowClause::Fetch { ties: Some((from, to)), .. } => {
                assert!(tokens[from].is_keyword("with"));
                assert!(tokens[to - 1].is_keyword("ties"));
            }
            other => panic!("unexpected clause {:?}", other),
        }
        let tokens = toks("SELECT a FROM t FETCH FIRST 5 ROWS ONLY");
        assert!(matches!(
            LimitEnforcement::find_clause(&tokens),
            RowClause::Fetch { ties: None, .. }
        ));
    }

    #[test]
    fn test_row_limits() {
        let limits = LimitsConfig {
            default_rows: 100,
            max_rows: 500,
        };
        let none = RowLimits::new(limits, None);
        assert_eq!(none.cap(), 500);
        assert_eq!(none.implicit(), 100);

        let low = RowLimits::new(limits, Some(20));
        assert_eq!(low.cap(), 20);
        assert_eq!(low.implicit(), 20);

        let high = RowLimits::new(limits, Some(10_000));
        assert_eq!(high.cap(), 500);
        assert_eq!(high.implicit(), 500);
    }
}
