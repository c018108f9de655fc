//! A declaration scanner for circuit files.
//!
//! [`HeaderScanner`] does not parse statement or expression syntax. It
//! recognizes the top-level declarations a build needs (pragmas, includes,
//! template signatures with their input signals, and the main component) and
//! skips everything else by brace matching.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use circa_diagnostics::{Diagnostic, DiagnosticSink, Location};
use circa_source::{
    MainComponentInfo, ResolvedFileData, ResolvedMainComponent, SignalInfo, TemplateInfo,
};
use tracing::trace;

use crate::expr::{evaluate, ExprError};
use crate::grammar::GrammarParser;
use crate::lexer::{lex, Token, TokenKind};

/// The bundled [`GrammarParser`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderScanner;

impl HeaderScanner {
    /// Creates a scanner.
    pub fn new() -> Self {
        Self
    }
}

impl GrammarParser for HeaderScanner {
    fn parse(&self, content: &str, path: &Path) -> Result<ResolvedFileData, Vec<Diagnostic>> {
        let sink = DiagnosticSink::new();
        let mut scanned = scan(content, &sink);
        if sink.has_errors() {
            return Err(sink.into_diagnostics());
        }
        scanned.resolve_main(content, &sink);
        if sink.has_errors() {
            return Err(sink.into_diagnostics());
        }
        trace!(
            path = %path.display(),
            includes = scanned.data.includes.len(),
            templates = scanned.data.templates.len(),
            "scanned declarations"
        );
        Ok(scanned.data)
    }

    fn template_inputs(
        &self,
        content: &str,
        _path: &Path,
        template: &str,
        parameter_values: &[i64],
    ) -> Result<Vec<SignalInfo>, Vec<Diagnostic>> {
        let sink = DiagnosticSink::new();
        let scanned = scan(content, &sink);
        if sink.has_errors() {
            return Err(sink.into_diagnostics());
        }
        let Some(decl) = scanned.decls.get(template) else {
            return Err(vec![Diagnostic::general(format!(
                "no template named `{template}`"
            ))]);
        };
        let signals = decl.bind(content, template, parameter_values, &sink);
        if sink.has_errors() {
            return Err(sink.into_diagnostics());
        }
        Ok(signals)
    }
}

/// A template's declared inputs with their unevaluated dimension expressions.
struct TemplateDecl {
    name_start: usize,
    parameters: Vec<String>,
    inputs: Vec<InputDecl>,
}

struct InputDecl {
    name: String,
    dimensions: Vec<Vec<Token>>,
}

impl TemplateDecl {
    /// Evaluates every input's dimensions with the template parameters bound.
    fn bind(
        &self,
        content: &str,
        template: &str,
        values: &[i64],
        sink: &DiagnosticSink,
    ) -> Vec<SignalInfo> {
        if values.len() != self.parameters.len() {
            sink.emit(Diagnostic::error(
                format!(
                    "template `{template}` takes {} parameter(s) but {} were given",
                    self.parameters.len(),
                    values.len()
                ),
                Location::of_offset(content, self.name_start),
            ));
            return Vec::new();
        }
        let bindings: HashMap<&str, i64> = self
            .parameters
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();

        let mut signals = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let mut dimensions = Vec::with_capacity(input.dimensions.len());
            for dim in &input.dimensions {
                match evaluate(dim, &bindings) {
                    Ok(v) => match u64::try_from(v) {
                        Ok(v) => dimensions.push(v),
                        Err(_) => sink.emit(Diagnostic::error(
                            format!("dimension of `{}` evaluates to {v}", input.name),
                            Location::of_offset(content, dim.first().map_or(0, |t| t.start)),
                        )),
                    },
                    Err(ExprError { message, offset }) => sink.emit(Diagnostic::error(
                        format!("cannot evaluate dimension of `{}`: {message}", input.name),
                        Location::of_offset(content, offset),
                    )),
                }
            }
            signals.push(SignalInfo {
                name: input.name.clone(),
                dimensions,
            });
        }
        signals
    }
}

/// Everything one scan of a file produced.
struct Scanned {
    data: ResolvedFileData,
    decls: BTreeMap<String, TemplateDecl>,
    main_args: Vec<Vec<Token>>,
    main_start: usize,
}

impl Scanned {
    /// Fills in the main component's concrete parameters and signals when its
    /// template is declared in this file and its arguments are constant.
    fn resolve_main(&mut self, content: &str, sink: &DiagnosticSink) {
        let Some(main) = self.data.main_component.as_mut() else {
            return;
        };
        let Some(decl) = self.decls.get(&main.template) else {
            return;
        };
        if self.main_args.len() != decl.parameters.len() {
            sink.emit(Diagnostic::error(
                format!(
                    "main component passes {} argument(s) to `{}`, which takes {}",
                    self.main_args.len(),
                    main.template,
                    decl.parameters.len()
                ),
                Location::of_offset(content, self.main_start),
            ));
            return;
        }
        let constants = HashMap::new();
        let values: Result<Vec<i64>, ExprError> = self
            .main_args
            .iter()
            .map(|arg| evaluate(arg, &constants))
            .collect();
        let Ok(parameter_values) = values else {
            return;
        };
        let quiet = DiagnosticSink::new();
        let signals = decl.bind(content, &main.template, &parameter_values, &quiet);
        if quiet.has_errors() {
            return;
        }
        main.resolved = Some(ResolvedMainComponent {
            parameter_values,
            signals,
        });
    }
}

fn scan(content: &str, sink: &DiagnosticSink) -> Scanned {
    let tokens = lex(content, sink);
    let mut scanner = Scanner {
        content,
        tokens,
        pos: 0,
        sink,
        out: Scanned {
            data: ResolvedFileData::default(),
            decls: BTreeMap::new(),
            main_args: Vec::new(),
            main_start: 0,
        },
    };
    scanner.scan_all();
    scanner.out
}

struct Scanner<'a> {
    content: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    sink: &'a DiagnosticSink,
    out: Scanned,
}

impl Scanner<'_> {
    fn peek(&self) -> &Token {
        // `lex` always appends Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn error_at(&self, msg: impl Into<String>, offset: usize) {
        self.sink
            .emit(Diagnostic::error(msg, Location::of_offset(self.content, offset)));
    }

    /// End offset of the previously consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.end)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().is_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char, after: &str) -> bool {
        if self.eat_punct(c) {
            return true;
        }
        self.error_at(format!("expected `{c}` after {after}"), self.prev_end());
        false
    }

    fn expect_ident(&mut self, what: &str) -> Option<(String, usize)> {
        let tok = self.peek().clone();
        if let TokenKind::Ident(name) = tok.kind {
            self.pos += 1;
            Some((name, tok.start))
        } else {
            self.error_at(format!("expected {what}"), tok.start);
            None
        }
    }

    /// Skips tokens up to and including the next top-level `;`, or up to a
    /// top-level `}` or a declaration keyword.
    fn recover(&mut self) {
        while !self.at_eof() {
            let tok = self.peek();
            if tok.is_punct(';') {
                self.pos += 1;
                return;
            }
            if ["pragma", "include", "template", "function", "bus", "component"]
                .iter()
                .any(|kw| tok.is_ident(kw))
            {
                return;
            }
            if tok.is_punct('{') {
                self.skip_block();
                continue;
            }
            self.pos += 1;
        }
    }

    /// Skips a `{ ... }` block starting at the current `{`. Returns `false` if
    /// the block is not closed.
    fn skip_block(&mut self) -> bool {
        let open = self.advance();
        let mut depth = 1usize;
        while !self.at_eof() {
            let tok = self.advance();
            if tok.is_punct('{') {
                depth += 1;
            } else if tok.is_punct('}') {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
        }
        self.error_at("unclosed `{`", open.start);
        false
    }

    fn scan_all(&mut self) {
        while !self.at_eof() {
            let tok = self.peek().clone();
            match &tok.kind {
                TokenKind::Ident(kw) if kw == "pragma" => self.pragma(),
                TokenKind::Ident(kw) if kw == "include" => self.include(),
                TokenKind::Ident(kw) if kw == "template" => self.template(),
                TokenKind::Ident(kw) if kw == "function" || kw == "bus" => self.skip_definition(),
                TokenKind::Ident(kw) if kw == "component" => self.main_component(),
                _ => {
                    self.error_at("expected a top-level declaration", tok.start);
                    self.pos += 1;
                    self.recover();
                }
            }
        }
    }

    fn pragma(&mut self) {
        self.advance();
        if self.peek().is_ident("circom") {
            self.advance();
            let first = self.peek().start;
            while !self.at_eof() && !self.peek().is_punct(';') && !self.peek().is_ident("include")
            {
                self.pos += 1;
            }
            let last = self.prev_end();
            if last > first {
                self.out.data.pragma.compiler_version =
                    Some(self.content[first..last].to_string());
            } else {
                self.error_at("expected a compiler version after `pragma circom`", first);
            }
        } else if self.peek().is_ident("custom_templates") {
            self.advance();
            self.out.data.pragma.custom_templates = true;
        } else {
            while !self.at_eof() && !self.peek().is_punct(';') {
                self.pos += 1;
            }
        }
        self.expect_punct(';', "pragma");
    }

    fn include(&mut self) {
        self.advance();
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Str(path) => {
                self.pos += 1;
                self.out.data.includes.push(path);
                self.expect_punct(';', "include");
            }
            _ => {
                self.error_at("expected a string after `include`", tok.start);
                self.recover();
            }
        }
    }

    fn skip_definition(&mut self) {
        self.advance();
        while !self.at_eof() && !self.peek().is_punct('{') {
            self.pos += 1;
        }
        if !self.at_eof() {
            self.skip_block();
        }
    }

    fn template(&mut self) {
        self.advance();
        let mut custom = false;
        while self.peek().is_ident("custom") || self.peek().is_ident("parallel") {
            custom |= self.advance().is_ident("custom");
        }
        let Some((name, name_start)) = self.expect_ident("a template name") else {
            self.recover();
            return;
        };

        let mut parameters = Vec::new();
        if self.expect_punct('(', "template name") {
            while !self.at_eof() && !self.peek().is_punct(')') {
                if let TokenKind::Ident(p) = self.advance().kind {
                    parameters.push(p);
                }
            }
            self.expect_punct(')', "template parameters");
        }

        if !self.peek().is_punct('{') {
            self.error_at(
                format!("expected `{{` to open template `{name}`"),
                self.prev_end(),
            );
            self.recover();
            return;
        }
        let inputs = self.template_body();

        if let Some(first) = self.out.decls.get(&name) {
            let Location { line, column } = Location::of_offset(self.content, first.name_start);
            self.sink.emit(
                Diagnostic::error(
                    format!("duplicate template `{name}`"),
                    Location::of_offset(self.content, name_start),
                )
                .with_note(format!("first declared at {line}:{column}")),
            );
            return;
        }
        self.out.data.templates.insert(
            name.clone(),
            TemplateInfo {
                parameters: parameters.clone(),
                inputs: inputs.iter().map(|i| i.name.clone()).collect(),
                custom,
            },
        );
        self.out.decls.insert(
            name,
            TemplateDecl {
                name_start,
                parameters,
                inputs,
            },
        );
    }

    /// Scans a template body starting at its `{`, collecting input signals.
    fn template_body(&mut self) -> Vec<InputDecl> {
        let open = self.advance();
        let mut depth = 1usize;
        let mut inputs = Vec::new();
        while !self.at_eof() {
            let tok = self.advance();
            if tok.is_punct('{') {
                depth += 1;
            } else if tok.is_punct('}') {
                depth -= 1;
                if depth == 0 {
                    return inputs;
                }
            } else if tok.is_ident("signal") && self.peek().is_ident("input") {
                self.advance();
                self.input_declaration(&mut inputs);
            }
        }
        self.error_at("unclosed template body", open.start);
        inputs
    }

    /// `signal input {tags} a[d1][d2], b;` after the `input` keyword.
    fn input_declaration(&mut self, inputs: &mut Vec<InputDecl>) {
        if self.peek().is_punct('{') {
            self.skip_block();
        }
        loop {
            let Some((name, _)) = self.expect_ident("an input signal name") else {
                return;
            };
            let mut dimensions = Vec::new();
            while self.peek().is_punct('[') {
                let open = self.advance();
                let mut depth = 1usize;
                let mut expr = Vec::new();
                loop {
                    if self.at_eof() {
                        self.error_at("unclosed `[`", open.start);
                        return;
                    }
                    let tok = self.advance();
                    if tok.is_punct('[') {
                        depth += 1;
                    } else if tok.is_punct(']') {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    expr.push(tok);
                }
                dimensions.push(expr);
            }
            inputs.push(InputDecl { name, dimensions });
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct(';', "signal declaration");
    }

    /// `component main {public [a, b]} = Template(args);`
    fn main_component(&mut self) {
        let start = self.advance().start;
        if !self.peek().is_ident("main") {
            self.error_at("only `component main` may be declared at top level", start);
            self.recover();
            return;
        }
        self.advance();

        let mut public_inputs = Vec::new();
        if self.eat_punct('{') {
            if !self.peek().is_ident("public") {
                self.error_at("expected `public` in main component", self.peek().start);
                self.recover();
                return;
            }
            self.advance();
            if !self.expect_punct('[', "`public`") {
                self.recover();
                return;
            }
            while !self.at_eof() && !self.peek().is_punct(']') {
                if let TokenKind::Ident(p) = self.advance().kind {
                    public_inputs.push(p);
                }
            }
            self.expect_punct(']', "public signal list");
            self.expect_punct('}', "public signal list");
        }

        if !self.expect_punct('=', "`component main`") {
            self.recover();
            return;
        }
        let Some((template, _)) = self.expect_ident("a template name") else {
            self.recover();
            return;
        };

        let mut args: Vec<Vec<Token>> = Vec::new();
        if self.expect_punct('(', "main template name") {
            let mut depth = 0usize;
            let mut current = Vec::new();
            while !self.at_eof() {
                let tok = self.peek().clone();
                if depth == 0 && tok.is_punct(')') {
                    break;
                }
                self.pos += 1;
                if depth == 0 && tok.is_punct(',') {
                    args.push(std::mem::take(&mut current));
                    continue;
                }
                if tok.is_punct('(') {
                    depth += 1;
                } else if tok.is_punct(')') {
                    depth -= 1;
                }
                current.push(tok);
            }
            if !current.is_empty() || !args.is_empty() {
                args.push(current);
            }
            self.expect_punct(')', "main component arguments");
        }
        self.expect_punct(';', "main component");

        if self.out.data.main_component.is_some() {
            self.error_at("a file may declare only one main component", start);
            return;
        }
        let parameters = args
            .iter()
            .map(|arg| match (arg.first(), arg.last()) {
                (Some(first), Some(last)) => self.content[first.start..last.end].to_string(),
                _ => String::new(),
            })
            .collect();
        self.out.data.main_component = Some(MainComponentInfo {
            template,
            public_inputs,
            parameters,
            resolved: None,
        });
        self.out.main_args = args;
        self.out.main_start = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPLIER: &str = r#"
pragma circom 2.1.6;

include "circomlib/circuits/comparators.circom";
include "./utils.circom";

/* Multiplies N values. */
template Multiplier(N) {
    signal input in[N];
    signal input scale;
    signal output out;
    signal acc[N];

    acc[0] <== in[0] * scale;
    for (var i = 1; i < N; i++) {
        acc[i] <== acc[i - 1] * in[i];
    }
    out <== acc[N - 1];
}

template Matrix(rows, cols) {
    signal input m[rows][cols * 2];
}

component main {public [scale]} = Multiplier(3);
"#;

    fn parse(src: &str) -> Result<ResolvedFileData, Vec<Diagnostic>> {
        HeaderScanner.parse(src, Path::new("test.circom"))
    }

    #[test]
    fn extracts_declarations() {
        let data = parse(MULTIPLIER).unwrap();
        assert_eq!(data.pragma.compiler_version.as_deref(), Some("2.1.6"));
        assert!(!data.pragma.custom_templates);
        assert_eq!(
            data.includes,
            vec!["circomlib/circuits/comparators.circom", "./utils.circom"]
        );
        let mult = &data.templates["Multiplier"];
        assert_eq!(mult.parameters, vec!["N"]);
        assert_eq!(mult.inputs, vec!["in", "scale"]);
        assert_eq!(data.templates["Matrix"].parameters, vec!["rows", "cols"]);

        let main = data.main_component.unwrap();
        assert_eq!(main.template, "Multiplier");
        assert_eq!(main.public_inputs, vec!["scale"]);
        assert_eq!(main.parameters, vec!["3"]);
    }

    #[test]
    fn main_component_resolved_when_constant() {
        let data = parse(MULTIPLIER).unwrap();
        let resolved = data.main_component.unwrap().resolved.unwrap();
        assert_eq!(resolved.parameter_values, vec![3]);
        assert_eq!(
            resolved.signals,
            vec![
                SignalInfo {
                    name: "in".into(),
                    dimensions: vec![3]
                },
                SignalInfo {
                    name: "scale".into(),
                    dimensions: vec![]
                },
            ]
        );
    }

    #[test]
    fn main_from_included_template_stays_unresolved() {
        let src = "include \"lib.circom\";\ncomponent main = Poseidon(2);\n";
        let data = parse(src).unwrap();
        let main = data.main_component.unwrap();
        assert_eq!(main.template, "Poseidon");
        assert!(main.resolved.is_none());
    }

    #[test]
    fn custom_templates() {
        let src = "pragma custom_templates;\ntemplate custom Gate() { signal input a; }\n";
        let data = parse(src).unwrap();
        assert!(data.pragma.custom_templates);
        assert!(data.templates["Gate"].custom);
        assert!(!data.has_main_component());
    }

    #[test]
    fn functions_and_tags_skipped() {
        let src = r#"
function sq(x) { return x * x; }
template T() {
    signal input {binary} flag, other[sq(2)];
}
"#;
        let data = parse(src).unwrap();
        assert_eq!(data.templates["T"].inputs, vec!["flag", "other"]);
    }

    #[test]
    fn reports_every_error() {
        let src = "include \"a.circom\"\ninclude \"b.circom\";\ninclude c;\n";
        let diags = parse(src).unwrap_err();
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message.contains("expected `;` after include"));
        assert_eq!(diags[0].location, Some(Location::new(1, 19)));
        assert!(diags[1].message.contains("expected a string"));
        assert_eq!(diags[1].location, Some(Location::new(3, 9)));
    }

    #[test]
    fn duplicate_template_reported() {
        let src = "template A() {}\ntemplate A() {}\n";
        let diags = parse(src).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("duplicate template `A`"));
        assert_eq!(diags[0].location, Some(Location::new(2, 10)));
        assert_eq!(diags[0].notes, vec!["first declared at 1:10"]);
    }

    #[test]
    fn unclosed_template_reported() {
        let diags = parse("template A(n) {\n signal input x[n];\n").unwrap_err();
        assert!(diags.iter().any(|d| d.message.contains("unclosed template body")));
    }

    #[test]
    fn main_argument_count_checked() {
        let src = "template A(n) { signal input x[n]; }\ncomponent main = A(1, 2);\n";
        let diags = parse(src).unwrap_err();
        assert!(diags[0].message.contains("passes 2 argument(s)"));
    }

    #[test]
    fn template_inputs_with_parameters() {
        let signals = HeaderScanner
            .template_inputs(MULTIPLIER, Path::new("t.circom"), "Matrix", &[2, 5])
            .unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].dimensions, vec![2, 10]);
        assert_eq!(signals[0].element_count(), 20);
    }

    #[test]
    fn template_inputs_errors() {
        let path = Path::new("t.circom");
        let diags = HeaderScanner
            .template_inputs(MULTIPLIER, path, "Missing", &[])
            .unwrap_err();
        assert!(diags[0].message.contains("no template named `Missing`"));

        let diags = HeaderScanner
            .template_inputs(MULTIPLIER, path, "Matrix", &[1])
            .unwrap_err();
        assert!(diags[0].message.contains("takes 2 parameter(s)"));

        let diags = HeaderScanner
            .template_inputs(MULTIPLIER, path, "Matrix", &[-1, 1])
            .unwrap_err();
        assert!(diags[0].message.contains("evaluates to -1"));
    }
}
