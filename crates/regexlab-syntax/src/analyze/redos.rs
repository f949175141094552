//! ReDoS (catastrophic-backtracking) analyzer (spec.md §4.7): four
//! structural detection rules over quantified repetitions, severity/score/
//! confidence aggregation, hotspot merging, and an optional bounded runtime
//! confirmation probe.

use crate::analyze::charset::first_set;
use crate::ast::*;
use crate::visit::{self, Visitor};
use regexlab_core::{CharSet, Span};

const SMALL_CONSTANT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Safe,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Severity {
    /// spec.md §4.7's severity -> score mapping.
    fn score(self) -> u32 {
        match self {
            Severity::Safe => 0,
            Severity::Low => 2,
            Severity::Medium => 5,
            Severity::High => 8,
            Severity::Critical => 10,
            Severity::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Off,
    Theoretical,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub pattern: String,
    pub trigger: String,
    pub confidence: Confidence,
    pub span: Span,
    pub suggested_rewrite: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Hotspot {
    pub start: u32,
    pub end: u32,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReDoSAnalysis {
    pub severity: Severity,
    pub score: u32,
    pub mode: Mode,
    pub confirmed: bool,
    pub confidence: Confidence,
    pub vulnerable_part: String,
    pub trigger: Option<String>,
    pub recommendations: Vec<String>,
    pub findings: Vec<Finding>,
    pub hotspots: Vec<Hotspot>,
    pub suggested_rewrite: Option<String>,
}

/// Run the four structural rules over `regex` and, when `mode` asks for it,
/// the bounded confirmation probe. Returns a `severity=safe` record for
/// non-`Regex` input rather than panicking, matching the rest of `analyze::*`.
pub fn analyze(regex: &Node, mode: Mode, confirm_options: &ConfirmOptions) -> ReDoSAnalysis {
    let Node::Regex(r) = regex else {
        return safe_analysis(mode);
    };
    let mut pass = RedosPass { flags: r.flags, findings: Vec::new() };
    pass.visit_node(&r.pattern);
    build_analysis(pass.findings, &r.pattern, r.flags, mode, confirm_options)
}

fn safe_analysis(mode: Mode) -> ReDoSAnalysis {
    ReDoSAnalysis {
        severity: Severity::Safe,
        score: 0,
        mode,
        confirmed: false,
        confidence: Confidence::Low,
        vulnerable_part: String::new(),
        trigger: None,
        recommendations: Vec::new(),
        findings: Vec::new(),
        hotspots: Vec::new(),
        suggested_rewrite: None,
    }
}

fn build_analysis(findings: Vec<Finding>, root: &Node, flags: Flags, mode: Mode, confirm_options: &ConfirmOptions) -> ReDoSAnalysis {
    if findings.is_empty() {
        return safe_analysis(mode);
    }
    let worst = findings.iter().map(|f| f.severity).max().unwrap();
    let confidence = if findings.iter().any(|f| f.confidence == Confidence::High) {
        Confidence::High
    } else if findings.iter().any(|f| f.confidence == Confidence::Medium) {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    let worst_finding = findings.iter().filter(|f| f.severity == worst).max_by_key(|f| f.span.len()).unwrap();
    let trigger = worst_finding.trigger.clone();
    let vulnerable_part = worst_finding.pattern.clone();
    let suggested_rewrite = worst_finding.suggested_rewrite.clone();
    let recommendations = findings.iter().filter_map(|f| f.suggested_rewrite.clone()).collect::<Vec<_>>();
    let hotspots = merge_hotspots(findings.iter().map(|f| Hotspot { start: f.span.start, end: f.span.end, severity: f.severity }).collect());

    let confirmed = match mode {
        Mode::Confirmed => findings.iter().any(|f| confirm(root, f, flags, confirm_options) == ProbeOutcome::Confirmed),
        _ => false,
    };

    ReDoSAnalysis {
        severity: worst,
        score: worst.score(),
        mode,
        confirmed,
        confidence,
        vulnerable_part,
        trigger: Some(trigger),
        recommendations,
        findings,
        hotspots,
        suggested_rewrite,
    }
}

/// Overlapping spans collapse to a single hotspot carrying the max severity
/// (spec.md §4.7: "used for heatmap rendering").
fn merge_hotspots(mut spots: Vec<Hotspot>) -> Vec<Hotspot> {
    spots.sort_by_key(|h| (h.start, h.end));
    let mut merged: Vec<Hotspot> = Vec::new();
    for spot in spots {
        if let Some(last) = merged.last_mut() {
            if spot.start < last.end {
                last.end = last.end.max(spot.end);
                last.severity = last.severity.max(spot.severity);
                continue;
            }
        }
        merged.push(spot);
    }
    merged
}

struct RedosPass {
    flags: Flags,
    findings: Vec<Finding>,
}

impl Visitor for RedosPass {
    fn visit_quantifier(&mut self, n: &QuantifierNode) {
        if is_unbounded_repetition(n) {
            let outer_first = first_set(&n.inner, self.flags);
            if let Some(nested) = find_nested_unbounded_quantifier(&n.inner, &outer_first, self.flags) {
                self.findings.push(Finding {
                    severity: Severity::High,
                    message: "nested unbounded quantifiers on overlapping atoms can backtrack exponentially".into(),
                    pattern: crate::compile::compile(n.inner.as_ref()),
                    trigger: "nested-unbounded-quantifier".into(),
                    confidence: Confidence::High,
                    span: n.span,
                    suggested_rewrite: Some(format!("make the inner quantifier possessive: {}++", render_inner_literal(&nested))),
                });
            }
            if let Some(evil) = find_evil_twin(&n.inner, self.flags) {
                self.findings.push(Finding {
                    severity: Severity::High,
                    message: "alternation branches overlap under an unbounded quantifier, enabling exponential backtracking".into(),
                    pattern: crate::compile::compile(n.inner.as_ref()),
                    trigger: "evil-twin-alternation".into(),
                    confidence: Confidence::High,
                    span: evil,
                    suggested_rewrite: Some("remove the overlapping alternative or make the repetition atomic: (?>...)".into()),
                });
            }
        }
        visit::walk_quantifier(self, n);
    }

    fn visit_sequence(&mut self, n: &SequenceNode) {
        let mut ambiguous_spans: Vec<Span> = Vec::new();
        for pair in n.children.windows(2) {
            if let (Node::Quantifier(x), Node::Quantifier(y)) = (&pair[0], &pair[1]) {
                if is_unbounded_repetition(x) && is_unbounded_repetition(y) {
                    let x_first = first_set(&x.inner, self.flags);
                    let y_first = first_set(&y.inner, self.flags);
                    if charset_subset(&y_first, &x_first) {
                        let span = x.span.cover(y.span);
                        ambiguous_spans.push(span);
                        self.findings.push(Finding {
                            severity: Severity::Medium,
                            message: "a following repetition's characters are a subset of the preceding one's, ambiguous backtracking over the boundary".into(),
                            pattern: format!("{}{}", crate::compile::compile(&pair[0]), crate::compile::compile(&pair[1])),
                            trigger: "ambiguous-adjacent-quantifiers".into(),
                            confidence: Confidence::Medium,
                            span,
                            suggested_rewrite: Some("make the first quantifier possessive to remove the ambiguity".into()),
                        });
                    }
                }
            }
        }
        for pair in n.children.windows(2) {
            if let Node::Quantifier(x) = &pair[0] {
                if is_unbounded_repetition(x) {
                    if let Some(lit_span) = literal_overlap(&pair[1], &x.inner, self.flags) {
                        let span = x.span.cover(lit_span);
                        let combined = ambiguous_spans.iter().any(|s| s.overlaps(span));
                        self.findings.push(Finding {
                            severity: if combined { Severity::High } else { Severity::Medium },
                            message: "a literal following an unbounded repetition shares characters with it, forcing backtracking on every failed match attempt".into(),
                            pattern: format!("{}{}", crate::compile::compile(&pair[0]), crate::compile::compile(&pair[1])),
                            trigger: "greedy-literal-overlap".into(),
                            confidence: Confidence::Medium,
                            span,
                            suggested_rewrite: Some("make the repetition possessive or atomic so it cannot give back the literal's characters".into()),
                        });
                    }
                }
            }
        }
        visit::walk_sequence(self, n);
    }
}

fn is_unbounded_repetition(q: &QuantifierNode) -> bool {
    match q.max {
        None => true,
        Some(max) => max.saturating_sub(q.min) > SMALL_CONSTANT,
    }
}

/// Peel off transparent wrappers (a group with a single child, a
/// single-element sequence) to find the construct a quantifier actually
/// repeats, mirroring how `(a+)+` really repeats `a+`, not the group node.
fn unwrap_transparent(node: &Node) -> &Node {
    match node {
        Node::Group(g) => unwrap_transparent(&g.child),
        Node::Sequence(s) if s.children.len() == 1 => unwrap_transparent(&s.children[0]),
        _ => node,
    }
}

fn find_nested_unbounded_quantifier<'a>(inner: &'a Node, outer_first: &CharSet, flags: Flags) -> Option<&'a QuantifierNode> {
    if let Node::Quantifier(q) = unwrap_transparent(inner) {
        if is_unbounded_repetition(q) {
            let nested_first = first_set(&q.inner, flags);
            if !outer_first.is_disjoint(&nested_first) {
                return Some(q);
            }
        }
    }
    None
}

fn find_evil_twin(inner: &Node, flags: Flags) -> Option<Span> {
    let Node::Alternation(alt) = unwrap_transparent(inner) else {
        return None;
    };
    for i in 0..alt.branches.len() {
        for j in (i + 1)..alt.branches.len() {
            let a = first_set(&alt.branches[i], flags);
            let b = first_set(&alt.branches[j], flags);
            if !a.is_disjoint(&b) {
                return Some(alt.span);
            }
        }
    }
    None
}

fn literal_overlap(node: &Node, x_inner: &Node, flags: Flags) -> Option<Span> {
    let Node::Literal(lit) = node else { return None };
    let c = lit.text.chars().next()?;
    if !c.is_ascii() {
        return None;
    }
    first_set(x_inner, flags).contains(c as u8).then_some(lit.span)
}

/// `a ⊆ b`. An unknown `a` is only a subset of another unknown set; an
/// unknown `b` contains everything.
fn charset_subset(a: &CharSet, b: &CharSet) -> bool {
    if b.is_unknown() {
        return true;
    }
    if a.is_unknown() {
        return false;
    }
    a.intersection(b) == *a
}

fn render_inner_literal(q: &QuantifierNode) -> String {
    crate::compile::compile(q.inner.as_ref())
}

/// Options for the bounded confirmation probe (spec.md §4.7, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmOptions {
    pub min_input_length: u32,
    pub max_input_length: u32,
    pub steps: u32,
    pub iterations: u32,
    pub timeout_ms: u64,
    pub backtrack_limit: u64,
    pub recursion_limit: u32,
    pub disable_jit: bool,
    pub preview_length: u32,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            min_input_length: 4,
            max_input_length: 64,
            steps: 6,
            iterations: 1,
            timeout_ms: 200,
            backtrack_limit: 200_000,
            recursion_limit: 2_000,
            disable_jit: true,
            preview_length: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    Confirmed,
    Theoretical,
}

/// Builds `prefix^n + suffix` probes of growing `n` (a char from the
/// culprit's first-set repeated, then one from its complement to force
/// backtracking at the very end) and runs a bounded backtracking matcher
/// against the whole pattern. If the step budget is exhausted before
/// `max_input_length` is reached, the finding is `confirmed`; otherwise it
/// remains `theoretical`.
fn confirm(root: &Node, finding: &Finding, flags: Flags, options: &ConfirmOptions) -> ProbeOutcome {
    let culprit_first = finding_probe_set(root, finding, flags);
    let prefix = culprit_first.sample().unwrap_or(b'a');
    let suffix = culprit_first.complement().sample().unwrap_or(b'!');

    let step = ((options.max_input_length - options.min_input_length) / options.steps.max(1)).max(1);
    let mut n = options.min_input_length;
    while n <= options.max_input_length {
        let mut probe = vec![prefix; n as usize];
        probe.push(suffix);
        let mut budget = options.backtrack_limit;
        let outcome = run_probe(root, &probe, flags, options.recursion_limit, &mut budget);
        if outcome == ProbeResult::BudgetExceeded {
            return ProbeOutcome::Confirmed;
        }
        n += step;
    }
    ProbeOutcome::Theoretical
}

/// Recovers a representative byte set for the span `finding` covers by
/// re-deriving the first-set of the node at that span. Falls back to the
/// whole pattern's first-set if nothing matches exactly (defensive; every
/// finding's span is produced from a real subtree).
fn finding_probe_set(root: &Node, finding: &Finding, flags: Flags) -> CharSet {
    find_node_at(root, finding.span).map(|n| first_set(n, flags)).unwrap_or_else(|| first_set(root, flags))
}

fn find_node_at(node: &Node, span: Span) -> Option<&Node> {
    if node.span() == span {
        return Some(node);
    }
    for child in node.children() {
        if span.is_within(child.span()) {
            if let Some(found) = find_node_at(child, span) {
                return Some(found);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeResult {
    Matched,
    Failed,
    BudgetExceeded,
}

/// A minimal backtracking matcher over the AST, used only to *confirm*
/// whether a structural finding actually blows its backtrack budget; it
/// isn't a general-purpose engine. Exotic constructs outside what ReDoS
/// findings are built from (lookarounds, backreferences, callouts, PCRE
/// verbs, conditionals, `\K`) pass through as zero-width no-ops rather than
/// failing the probe outright.
fn run_probe(root: &Node, input: &[u8], flags: Flags, recursion_limit: u32, budget: &mut u64) -> ProbeResult {
    for start in 0..=input.len() {
        let mut success = false;
        step(root, input, start, flags, recursion_limit, budget, &mut |_pos, _budget| {
            success = true;
            false
        });
        if *budget == 0 {
            return ProbeResult::BudgetExceeded;
        }
        if success {
            return ProbeResult::Matched;
        }
    }
    ProbeResult::Failed
}

/// Continuation-passing backtracking step. Return value and `k`'s return
/// value share one meaning: `true` means "keep searching other
/// alternatives", `false` means "stop now" — either because `k` reported a
/// full match, or because `budget` hit zero. Callers distinguish the two by
/// checking `*budget == 0` afterward, which is exactly what `run_probe`
/// does to decide a finding is confirmed.
fn step(node: &Node, input: &[u8], pos: usize, flags: Flags, depth_limit: u32, budget: &mut u64, k: &mut dyn FnMut(usize, &mut u64) -> bool) -> bool {
    if *budget == 0 || depth_limit == 0 {
        *budget = 0;
        return false;
    }
    *budget -= 1;
    let depth_limit = depth_limit - 1;

    match node {
        Node::Regex(n) => step(&n.pattern, input, pos, flags, depth_limit, budget, k),
        Node::Sequence(n) => step_sequence(&n.children, input, pos, flags, depth_limit, budget, k),
        Node::Alternation(n) => {
            for branch in &n.branches {
                if !step(branch, input, pos, flags, depth_limit, budget, k) {
                    return false;
                }
            }
            true
        }
        Node::Group(n) => step(&n.child, input, pos, flags, depth_limit, budget, k),
        Node::Quantifier(n) => step_quantifier_from(n, input, pos, 0, flags, depth_limit, budget, k),
        Node::Literal(n) => step_literal(&n.text, input, pos, budget, k),
        Node::Anchor(n) => step_anchor(n.kind, input, pos, budget, k),
        Node::Conditional(n) => step(&n.yes, input, pos, flags, depth_limit, budget, k),
        Node::ScriptRun(n) => step(&n.child, input, pos, flags, depth_limit, budget, k),
        _ => match byte_matcher(node, flags) {
            Some(set) => {
                if pos < input.len() && set.contains(input[pos]) {
                    k(pos + 1, budget)
                } else {
                    true
                }
            }
            None => k(pos, budget),
        },
    }
}

fn step_sequence(children: &[Node], input: &[u8], pos: usize, flags: Flags, depth_limit: u32, budget: &mut u64, k: &mut dyn FnMut(usize, &mut u64) -> bool) -> bool {
    match children.split_first() {
        None => k(pos, budget),
        Some((head, rest)) => {
            step(head, input, pos, flags, depth_limit, budget, &mut |p, b| step_sequence(rest, input, p, flags, depth_limit, b, k))
        }
    }
}

fn step_quantifier_from(
    n: &QuantifierNode,
    input: &[u8],
    pos: usize,
    count: u32,
    flags: Flags,
    depth_limit: u32,
    budget: &mut u64,
    k: &mut dyn FnMut(usize, &mut u64) -> bool,
) -> bool {
    if *budget == 0 || depth_limit == 0 {
        *budget = 0;
        return false;
    }
    let at_max = n.max.is_some_and(|m| count >= m);
    let can_stop = count >= n.min;
    let try_more = !at_max;
    let greedy = matches!(n.kind, QuantifierType::Greedy | QuantifierType::Possessive);

    fn repeat(
        n: &QuantifierNode,
        input: &[u8],
        pos: usize,
        count: u32,
        flags: Flags,
        depth_limit: u32,
        try_more: bool,
        budget: &mut u64,
        k: &mut dyn FnMut(usize, &mut u64) -> bool,
    ) -> bool {
        if !try_more {
            return true;
        }
        step(&n.inner, input, pos, flags, depth_limit - 1, budget, &mut |p, b| {
            if p == pos {
                // zero-width repeat body: stop instead of looping forever.
                return true;
            }
            step_quantifier_from(n, input, p, count + 1, flags, depth_limit - 1, b, k)
        })
    }
    fn stop(pos: usize, can_stop: bool, budget: &mut u64, k: &mut dyn FnMut(usize, &mut u64) -> bool) -> bool {
        if !can_stop {
            return true;
        }
        k(pos, budget)
    }

    if greedy {
        if !repeat(n, input, pos, count, flags, depth_limit, try_more, budget, k) {
            return false;
        }
        stop(pos, can_stop, budget, k)
    } else {
        if !stop(pos, can_stop, budget, k) {
            return false;
        }
        repeat(n, input, pos, count, flags, depth_limit, try_more, budget, k)
    }
}

fn step_literal(text: &str, input: &[u8], pos: usize, budget: &mut u64, k: &mut dyn FnMut(usize, &mut u64) -> bool) -> bool {
    let bytes = text.as_bytes();
    if pos + bytes.len() <= input.len() && &input[pos..pos + bytes.len()] == bytes {
        k(pos + bytes.len(), budget)
    } else {
        true
    }
}

fn step_anchor(kind: AnchorKind, input: &[u8], pos: usize, budget: &mut u64, k: &mut dyn FnMut(usize, &mut u64) -> bool) -> bool {
    let holds = match kind {
        AnchorKind::CaretStart | AnchorKind::StringStart => pos == 0,
        AnchorKind::DollarEnd | AnchorKind::StringEndAbsolute | AnchorKind::StringEndBeforeNewline => pos == input.len(),
    };
    if holds { k(pos, budget) } else { true }
}

/// For the handful of node kinds that match exactly one byte, the node's
/// own first-set already *is* its byte-matching set.
fn byte_matcher(node: &Node, flags: Flags) -> Option<CharSet> {
    match node {
        Node::CharLiteral(_) | Node::CharType(_) | Node::Dot(_) | Node::CharClass(_) | Node::PosixClass(_) | Node::UnicodeProp(_) => {
            Some(first_set(node, flags))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn triggers(pattern: &str) -> Vec<String> {
        let ast = parse(pattern).expect("valid pattern");
        analyze(&ast, Mode::Theoretical, &ConfirmOptions::default()).findings.into_iter().map(|f| f.trigger).collect()
    }

    #[test]
    fn flags_nested_unbounded_quantifier() {
        let report = analyze(&parse("/(a+)+b/").unwrap(), Mode::Theoretical, &ConfirmOptions::default());
        assert_eq!(report.severity, Severity::High);
        assert!(report.findings.iter().any(|f| f.trigger == "nested-unbounded-quantifier"));
    }

    #[test]
    fn flags_evil_twin_alternation() {
        assert!(triggers("/(a|a)+/").contains(&"evil-twin-alternation".to_string()));
    }

    #[test]
    fn flags_ambiguous_adjacent_quantifiers() {
        assert!(triggers("/\\w+\\d+/").contains(&"ambiguous-adjacent-quantifiers".to_string()));
    }

    #[test]
    fn flags_greedy_then_literal_overlap() {
        assert!(triggers("/a+a/").contains(&"greedy-literal-overlap".to_string()));
    }

    #[test]
    fn safe_pattern_has_no_findings() {
        let report = analyze(&parse("/abc/").unwrap(), Mode::Theoretical, &ConfirmOptions::default());
        assert_eq!(report.severity, Severity::Safe);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn confirmation_runner_confirms_known_blowup() {
        let ast = parse("/(a+)+b/").unwrap();
        let report = analyze(&ast, Mode::Confirmed, &ConfirmOptions { max_input_length: 24, min_input_length: 8, steps: 4, ..ConfirmOptions::default() });
        assert!(report.confirmed);
    }

    #[test]
    fn hotspots_merge_overlapping_spans_to_max_severity() {
        let report = analyze(&parse("/(a+)+b/").unwrap(), Mode::Theoretical, &ConfirmOptions::default());
        assert!(!report.hotspots.is_empty());
        assert!(report.hotspots.iter().all(|h| h.start < h.end));
    }
}
