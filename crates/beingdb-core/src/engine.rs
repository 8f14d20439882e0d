//! Query Engine + Safety (spec §4.5): pattern scan, the recursive conjunctive
//! join, and the streaming/materialized execution entry points.
//!
//! The binding protocol (spec §4.5 "Binding protocol") is implemented as a
//! boxed recursive async function so each step can `.await` a suspension
//! point into the pack and yield cooperatively, matching the cooperative
//! scheduling model of spec §5.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::encode::decode;
use crate::error::{BeingDbError, BeingDbResult};
use crate::pack::Pack;
use crate::types::{Arg, Binding, Matcher, Pattern, Query, Term};

/// Tunables for one engine instance (spec §4.5 "Safety budget", §5).
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Wall-clock deadline for a single `execute`/`execute_streaming` call.
    pub query_timeout: Duration,
    /// Cap on candidate bindings produced during one query's join (partial,
    /// pre-offset). Breaching this aborts with [`BeingDbError::IntermediateCap`].
    pub max_intermediate_results: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { query_timeout: Duration::from_secs(5), max_intermediate_results: 10_000 }
    }
}

/// The result envelope's data (spec §4.5 "Result envelope"), before HTTP-layer
/// JSON rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Variable names in engine (post-optimizer) order.
    pub variables: Vec<String>,
    /// Bindings in production order.
    pub bindings: Vec<Binding>,
    /// Total bindings before pagination; `None` when the streaming path
    /// skipped a counting pass (see `SPEC_FULL.md` §5).
    pub total: Option<usize>,
}

/// Query engine over one immutable [`Pack`].
pub struct Engine {
    pack: Arc<Pack>,
    config: ExecutionConfig,
}

impl Engine {
    /// Build an engine over `pack` with the given execution budget.
    pub fn new(pack: Arc<Pack>, config: ExecutionConfig) -> Self {
        Self { pack, config }
    }

    /// `list_predicates(pack) → [name]`.
    pub async fn list_predicates(&self) -> BeingDbResult<Vec<String>> {
        self.pack.list_predicates().await
    }

    /// `list_predicates_with_arity(pack) → [(name, arity)]`.
    pub async fn list_predicates_with_arity(&self) -> BeingDbResult<Vec<(String, usize)>> {
        self.pack.list_predicates_with_arity().await
    }

    /// `query_all(pack, name) → [[arg]]`: every fact under `name`, decoded,
    /// in pack key order.
    pub async fn query_all(&self, predicate: &str) -> BeingDbResult<Vec<Vec<Arg>>> {
        let facts = self.pack.facts(predicate).await?;
        Ok(facts.into_iter().map(|(encoded_args, value_blob)| decode(&encoded_args, &value_blob)).collect())
    }

    /// `query_predicate(pack, name, pattern, offset?, limit?) → [[arg]]`:
    /// scan-and-filter with native offset/limit, cooperatively yielding
    /// between fact-list iterations (spec §5). Counts every scanned candidate
    /// against `max_intermediate_results`, the same safety budget `join_step`
    /// enforces, so an unbounded single-pattern scan can't bypass the cap.
    pub async fn query_predicate(
        &self,
        predicate: &str,
        matcher: &Matcher,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> BeingDbResult<Vec<Vec<Arg>>> {
        let facts = self.pack.facts(predicate).await?;
        let mut out = Vec::new();
        let mut skip_remaining = offset.unwrap_or(0);
        let cap = self.config.max_intermediate_results;
        let mut count = 0usize;

        for (encoded_args, value_blob) in facts {
            tokio::task::yield_now().await;

            count += 1;
            if count > cap {
                return Err(BeingDbError::IntermediateCap(cap));
            }

            let args = decode(&encoded_args, &value_blob);
            if !matches_args(&args, matcher) {
                continue;
            }
            if skip_remaining > 0 {
                skip_remaining -= 1;
                continue;
            }
            out.push(args);
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
        }

        Ok(out)
    }

    /// `execute(pack, query) → result`: full materialization, no pagination.
    /// `total` is always `Some`.
    pub async fn execute(&self, query: &Query) -> BeingDbResult<ExecutionResult> {
        let bindings = self.run_join(query, 0, None).await?;
        let total = bindings.len();
        Ok(ExecutionResult { variables: query.variables.clone(), bindings, total: Some(total) })
    }

    /// `execute_streaming(pack, query, offset, limit) → result`: bounded-memory
    /// pagination. `total` is always `None` (spec §9 open question, resolved
    /// in `SPEC_FULL.md` §5: no counting pre-pass).
    ///
    /// A single-pattern query bypasses the join machinery entirely and uses
    /// `query_predicate`'s native offset/limit, matching spec §4.5's
    /// "single-pattern: scan-and-filter with native offset/limit."
    pub async fn execute_streaming(
        &self,
        query: &Query,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> BeingDbResult<ExecutionResult> {
        let offset = offset.map(|o| o as usize);
        let limit = limit.map(|l| l as usize);

        if query.patterns.len() == 1 {
            let pattern = &query.patterns[0];
            let matcher = crate::types::resolve_pattern(&pattern.terms, &Binding::new());
            let matches = self.timed(self.query_predicate(&pattern.name, &matcher, offset, limit)).await?;
            let bindings = matches
                .into_iter()
                .filter_map(|args| extend_binding(&Binding::new(), &pattern.terms, &args))
                .collect();
            return Ok(ExecutionResult { variables: query.variables.clone(), bindings, total: None });
        }

        let bindings = self.run_join(query, offset.unwrap_or(0), limit).await?;
        Ok(ExecutionResult { variables: query.variables.clone(), bindings, total: None })
    }

    async fn run_join(&self, query: &Query, skip: usize, limit: Option<usize>) -> BeingDbResult<Vec<Binding>> {
        self.timed(self.run_join_inner(query, skip, limit)).await
    }

    async fn timed<T>(&self, fut: impl Future<Output = BeingDbResult<T>>) -> BeingDbResult<T> {
        match tokio::time::timeout(self.config.query_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BeingDbError::Timeout),
        }
    }

    async fn run_join_inner(&self, query: &Query, skip: usize, limit: Option<usize>) -> BeingDbResult<Vec<Binding>> {
        let mut ctx = JoinCtx { count: 0, cap: self.config.max_intermediate_results, skip_remaining: skip, limit, collected: Vec::new() };
        join_step(&self.pack, &query.patterns, 0, Binding::new(), &mut ctx).await?;
        Ok(ctx.collected)
    }
}

struct JoinCtx {
    count: usize,
    cap: usize,
    skip_remaining: usize,
    limit: Option<usize>,
    collected: Vec<Binding>,
}

impl JoinCtx {
    /// Record one complete binding. Returns `false` once the caller should
    /// stop all further recursion (limit reached).
    fn emit(&mut self, binding: Binding) -> bool {
        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            return true;
        }
        self.collected.push(binding);
        match self.limit {
            Some(limit) if self.collected.len() >= limit => false,
            _ => true,
        }
    }
}

/// One step of the recursive binding protocol (spec §4.5 "Binding protocol").
/// Returns `Ok(false)` to signal the caller to stop recursing (limit hit).
fn join_step<'a>(
    pack: &'a Pack,
    patterns: &'a [Pattern],
    idx: usize,
    binding: Binding,
    ctx: &'a mut JoinCtx,
) -> Pin<Box<dyn Future<Output = BeingDbResult<bool>> + 'a>> {
    Box::pin(async move {
        tokio::task::yield_now().await;

        if idx == patterns.len() {
            return Ok(ctx.emit(binding));
        }

        let pattern = &patterns[idx];
        let matcher = crate::types::resolve_pattern(&pattern.terms, &binding);
        let facts = pack.facts(&pattern.name).await?;

        for (encoded_args, value_blob) in facts {
            tokio::task::yield_now().await;

            ctx.count += 1;
            if ctx.count > ctx.cap {
                return Err(BeingDbError::IntermediateCap(ctx.cap));
            }

            let args = decode(&encoded_args, &value_blob);
            if !matches_args(&args, &matcher) {
                continue;
            }

            let Some(next_binding) = extend_binding(&binding, &pattern.terms, &args) else {
                continue;
            };

            let keep_going = join_step(pack, patterns, idx + 1, next_binding, ctx).await?;
            if !keep_going {
                return Ok(false);
            }
        }

        Ok(true)
    })
}

/// `matches_args`: spec §8 property 3 — arity equal, and a wildcard matcher
/// position matches anything; a literal matcher position matches iff its
/// text equals the argument's text.
fn matches_args(args: &[Arg], matcher: &Matcher) -> bool {
    if args.len() != matcher.len() {
        return false;
    }
    args.iter().zip(matcher.iter()).all(|(arg, m)| match m {
        None => true,
        Some(text) => arg.text() == text,
    })
}

/// Extend `binding` with any still-unbound `Var`s in `terms`, matched
/// position-wise against `args`. Returns `None` if a `Var` already bound in
/// `binding` would be re-bound to a different value (spec §4.5: "a conflict
/// occurs ... such branches are pruned").
fn extend_binding(binding: &Binding, terms: &[Term], args: &[Arg]) -> Option<Binding> {
    let mut next = binding.clone();
    for (term, arg) in terms.iter().zip(args.iter()) {
        if let Term::Var(name) = term {
            match next.get(name) {
                Some(existing) if existing != arg.text() => return None,
                Some(_) => {}
                None => {
                    next.insert(name.clone(), arg.text().to_string());
                }
            }
        }
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::parse::{parse_fact_line, parse_query};

    async fn pack_from(lines: &[(&str, &str)]) -> (tempfile::TempDir, Arc<Pack>) {
        let source = tempfile::tempdir().unwrap();
        for (file_name, contents) in lines {
            std::fs::write(source.path().join(file_name), contents).unwrap();
        }
        let pack_dir = tempfile::tempdir().unwrap();
        compile(source.path(), pack_dir.path()).await.unwrap();
        let pack = Arc::new(Pack::open(pack_dir.path()).unwrap());
        (pack_dir, pack)
    }

    #[tokio::test]
    async fn single_pattern_join_s1() {
        let (_dir, pack) = pack_from(&[(
            "created.pl",
            "created(tina_keane, she).\ncreated(tina_keane, faded_wallpaper).\n",
        )])
        .await;
        let engine = Engine::new(pack, ExecutionConfig::default());
        let query = parse_query("created(tina_keane, Work)").unwrap();
        let result = engine.execute(&query).await.unwrap();

        assert_eq!(result.variables, vec!["Work".to_string()]);
        assert_eq!(result.total, Some(2));
        let works: Vec<&str> = result.bindings.iter().map(|b| b["Work"].as_str()).collect();
        assert_eq!(works, vec!["she", "faded_wallpaper"]);
    }

    #[tokio::test]
    async fn two_pattern_join_s2() {
        let (_dir, pack) = pack_from(&[
            ("created.pl", "created(tina_keane, she).\ncreated(tina_keane, faded_wallpaper).\n"),
            ("shown_in.pl", "shown_in(she, rewind_1995).\nshown_in(faded_wallpaper, ica_2010).\n"),
        ])
        .await;
        let engine = Engine::new(pack, ExecutionConfig::default());
        let query = parse_query("created(tina_keane, Work), shown_in(Work, E)").unwrap();
        let result = engine.execute(&query).await.unwrap();

        let pairs: Vec<(&str, &str)> =
            result.bindings.iter().map(|b| (b["Work"].as_str(), b["E"].as_str())).collect();
        assert_eq!(pairs, vec![("she", "rewind_1995"), ("faded_wallpaper", "ica_2010")]);
    }

    #[tokio::test]
    async fn string_argument_join_s3() {
        let (_dir, pack) = pack_from(&[("keyword.pl", r#"keyword(doc_456, "neural networks")."#)]).await;
        let engine = Engine::new(pack, ExecutionConfig::default());
        let query = parse_query(r#"keyword(Doc, "neural networks")"#).unwrap();
        let result = engine.execute(&query).await.unwrap();

        assert_eq!(result.bindings.len(), 1);
        assert_eq!(result.bindings[0]["Doc"], "doc_456");
    }

    #[tokio::test]
    async fn repeated_variable_pattern_prunes_conflicts() {
        let fact = parse_fact_line("p(a, b).").unwrap();
        assert_eq!(fact.name, "p");
        let (_dir, pack) = pack_from(&[("p.pl", "p(a, a).\np(a, b).\n")]).await;
        let engine = Engine::new(pack, ExecutionConfig::default());
        let query = parse_query("p(X, X)").unwrap();
        let result = engine.execute(&query).await.unwrap();

        assert_eq!(result.bindings.len(), 1);
        assert_eq!(result.bindings[0]["X"], "a");
    }

    #[tokio::test]
    async fn pagination_matches_s5() {
        let lines: String = (1..=10).map(|i| format!("data({i}).\n")).collect();
        let (_dir, pack) = pack_from(&[("data.pl", &lines)]).await;
        let engine = Engine::new(pack, ExecutionConfig::default());
        let query = parse_query("data(X)").unwrap();

        let full = engine.execute(&query).await.unwrap();
        assert_eq!(full.total, Some(10));

        let page = engine.execute_streaming(&query, Some(5), Some(100)).await.unwrap();
        assert_eq!(page.total, None);
        let values: Vec<&str> = page.bindings.iter().map(|b| b["X"].as_str()).collect();
        assert_eq!(values, vec!["6", "7", "8", "9", "10"]);
    }

    #[tokio::test]
    async fn intermediate_cap_aborts_join() {
        let lines: String = (1..=20).map(|i| format!("data({i}).\n")).collect();
        let (_dir, pack) = pack_from(&[("data.pl", &lines)]).await;
        let config = ExecutionConfig { max_intermediate_results: 5, ..ExecutionConfig::default() };
        let engine = Engine::new(pack, config);
        let query = parse_query("data(X)").unwrap();

        let err = engine.execute(&query).await.unwrap_err();
        assert!(matches!(err, BeingDbError::IntermediateCap(5)));
    }

    #[tokio::test]
    async fn intermediate_cap_aborts_single_pattern_streaming_scan() {
        let lines: String = (1..=20).map(|i| format!("data({i}).\n")).collect();
        let (_dir, pack) = pack_from(&[("data.pl", &lines)]).await;
        let config = ExecutionConfig { max_intermediate_results: 5, ..ExecutionConfig::default() };
        let engine = Engine::new(pack, config);
        let query = parse_query("data(X)").unwrap();

        let err = engine.execute_streaming(&query, None, Some(100)).await.unwrap_err();
        assert!(matches!(err, BeingDbError::IntermediateCap(5)));
    }
}
