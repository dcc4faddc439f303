//! C preprocessing ahead of tree-sitter
//!
//! Evaluates conditional directives and expands macros before a fragment
//! reaches the grammar. One macro table is shared by every fragment of a
//! translation unit, seeded by the predefined text.
//!
//! Active `#define`, `#undef` and `#include` lines are kept so the syntax
//! tree still records them. Every other directive and every skipped line
//! becomes an empty line, so line numbers in the output match the input.

use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while preprocessing a fragment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    #[error("line {line}: #error {message}")]
    Directive { line: u32, message: String },

    #[error("line {line}: invalid #if expression: {message}")]
    Expression { line: u32, message: String },

    #[error("line {line}: #{directive} without matching #if")]
    Unbalanced { line: u32, directive: String },

    #[error("line {line}: conditional is never closed")]
    Unterminated { line: u32 },

    #[error("line {line}: malformed #define")]
    BadDefine { line: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ident,
    Number,
    Literal,
    Punct,
    Space,
    Newline,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    text: String,
    /// Macros that must not expand this token again
    hide: Vec<String>,
}

impl Token {
    fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            hide: Vec::new(),
        }
    }

    fn newline() -> Self {
        Self::new(Kind::Newline, "\n")
    }

    fn is(&self, punct: &str) -> bool {
        self.kind == Kind::Punct && self.text == punct
    }

    fn is_blank(&self) -> bool {
        matches!(self.kind, Kind::Space | Kind::Newline)
    }
}

#[derive(Debug, Clone)]
struct Macro {
    /// `None` for object-like macros
    params: Option<Vec<String>>,
    /// Last parameter collects the remaining arguments
    variadic: bool,
    body: Vec<Token>,
}

/// One open `#if`/`#ifdef`/`#ifndef` group
#[derive(Debug)]
struct Cond {
    line: u32,
    parent_active: bool,
    active: bool,
    taken: bool,
    seen_else: bool,
}

/// Macro-expanding preprocessor
#[derive(Debug, Default)]
pub struct Preprocessor {
    macros: HashMap<String, Macro>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a macro is currently defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Preprocess one fragment, keeping definitions for the next one
    pub fn run(&mut self, source: &str) -> Result<String, PreprocessError> {
        let mut out = String::with_capacity(source.len());
        let mut text = Vec::new();
        let mut conds: Vec<Cond> = Vec::new();

        for line in logical_lines(source) {
            let Some(directive) = line.text.trim_start().strip_prefix('#') else {
                if is_active(&conds) {
                    text.extend(lex(&line.text));
                }
                text.extend((0..line.span).map(|_| Token::newline()));
                continue;
            };

            out.push_str(&render(self.expand(std::mem::take(&mut text))));
            if let Some(kept) = self.directive(directive, line.number, &mut conds)? {
                out.push_str(&kept);
            }
            out.extend((0..line.span).map(|_| '\n'));
        }
        out.push_str(&render(self.expand(text)));

        if let Some(open) = conds.last() {
            return Err(PreprocessError::Unterminated { line: open.line });
        }
        Ok(out)
    }

    /// Handle a directive; returns the line to keep in the output, if any
    fn directive(
        &mut self,
        rest: &str,
        line: u32,
        conds: &mut Vec<Cond>,
    ) -> Result<Option<String>, PreprocessError> {
        let rest = rest.trim_start();
        let (name, args) = rest.split_at(ident_len(rest));
        let args = args.trim();
        let enabled = is_active(conds);

        match name {
            "if" | "ifdef" | "ifndef" => {
                let taken = enabled && self.branch_taken(name, args, line)?;
                conds.push(Cond {
                    line,
                    parent_active: enabled,
                    active: taken,
                    taken,
                    seen_else: false,
                });
            }
            "elif" | "elifdef" | "elifndef" => {
                let cond = open_cond(conds, name, line)?;
                let take = cond.parent_active && !cond.taken && self.branch_taken(name, args, line)?;
                cond.active = take;
                cond.taken |= take;
            }
            "else" => {
                let cond = open_cond(conds, name, line)?;
                cond.seen_else = true;
                cond.active = cond.parent_active && !cond.taken;
                cond.taken = true;
            }
            "endif" => {
                if conds.pop().is_none() {
                    return Err(PreprocessError::Unbalanced {
                        line,
                        directive: name.to_string(),
                    });
                }
            }
            _ if !enabled => {}
            "define" => {
                self.define(args, line)?;
                return Ok(Some(format!("#define {}", args)));
            }
            "undef" => {
                let name = first_ident(args);
                self.macros.remove(name);
                return Ok(Some(format!("#undef {}", name)));
            }
            "include" | "include_next" => return Ok(Some(format!("#include {}", args))),
            "error" => {
                return Err(PreprocessError::Directive {
                    line,
                    message: args.to_string(),
                })
            }
            "warning" => warn!("line {}: #warning {}", line, args),
            "" | "pragma" | "line" | "ident" => {}
            other => debug!("Ignoring #{} on line {}", other, line),
        }
        Ok(None)
    }

    fn branch_taken(&self, directive: &str, args: &str, line: u32) -> Result<bool, PreprocessError> {
        Ok(match directive {
            "ifdef" | "elifdef" => self.is_defined(first_ident(args)),
            "ifndef" | "elifndef" => !self.is_defined(first_ident(args)),
            _ => self.condition(args, line)?,
        })
    }

    fn define(&mut self, args: &str, line: u32) -> Result<(), PreprocessError> {
        let (name, rest) = args.split_at(ident_len(args));
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(PreprocessError::BadDefine { line });
        }

        let mac = match rest.strip_prefix('(') {
            Some(list) => {
                let close = list.find(')').ok_or(PreprocessError::BadDefine { line })?;
                let mut params = Vec::new();
                let mut variadic = false;
                for param in list[..close].split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    if param == "..." {
                        params.push("__VA_ARGS__".to_string());
                        variadic = true;
                    } else if let Some(named) = param.strip_suffix("...") {
                        params.push(named.trim().to_string());
                        variadic = true;
                    } else {
                        params.push(param.to_string());
                    }
                }
                Macro {
                    params: Some(params),
                    variadic,
                    body: trim_blank(lex(&list[close + 1..])),
                }
            }
            None => Macro {
                params: None,
                variadic: false,
                body: trim_blank(lex(rest)),
            },
        };

        self.macros.insert(name.to_string(), mac);
        Ok(())
    }

    /// Expand every macro invocation in a token stream
    fn expand(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut input: VecDeque<Token> = tokens.into();
        let mut out = Vec::new();
        // newlines swallowed by multi-line invocations, emitted at the end of the line
        let mut deferred = 0;

        while let Some(token) = input.pop_front() {
            if token.kind == Kind::Newline {
                out.extend((0..=deferred).map(|_| Token::newline()));
                deferred = 0;
                continue;
            }
            if token.kind != Kind::Ident || token.hide.contains(&token.text) {
                out.push(token);
                continue;
            }
            let Some(mac) = self.macros.get(&token.text) else {
                out.push(token);
                continue;
            };

            let replacement = match &mac.params {
                None => mac.body.clone(),
                Some(params) => {
                    let Some((args, consumed, newlines)) = collect_args(&input) else {
                        out.push(token);
                        continue;
                    };
                    let Some(args) = bind_args(params, mac.variadic, args) else {
                        debug!("Wrong argument count for {}, left unexpanded", token.text);
                        out.push(token);
                        continue;
                    };
                    input.drain(..consumed);
                    deferred += newlines;
                    self.substitute(mac, params, &args)
                }
            };

            let mut hide = token.hide;
            hide.push(token.text);
            for mut tok in replacement.into_iter().rev() {
                for name in &hide {
                    if !tok.hide.contains(name) {
                        tok.hide.push(name.clone());
                    }
                }
                input.push_front(tok);
            }
        }
        out.extend((0..deferred).map(|_| Token::newline()));
        out
    }

    /// Replace parameters in a function-like macro body, handling `#` and `##`
    fn substitute(&self, mac: &Macro, params: &[String], args: &[Vec<Token>]) -> Vec<Token> {
        let param = |tok: &Token| {
            if tok.kind == Kind::Ident {
                params.iter().position(|p| *p == tok.text)
            } else {
                None
            }
        };
        let body = &mac.body;
        let mut out: Vec<Token> = Vec::new();
        let mut i = 0;

        while i < body.len() {
            let tok = &body[i];

            if tok.is("#") {
                if let Some((j, p)) = next_solid(body, i + 1).and_then(|j| param(&body[j]).map(|p| (j, p))) {
                    out.push(stringify(&args[p]));
                    i = j + 1;
                    continue;
                }
            }

            if tok.is("##") {
                while out.last().is_some_and(Token::is_blank) {
                    out.pop();
                }
                let Some(j) = next_solid(body, i + 1) else {
                    i += 1;
                    continue;
                };
                let rhs = match param(&body[j]) {
                    Some(p) => args[p].clone(),
                    None => vec![body[j].clone()],
                };

                if rhs.is_empty() {
                    // `, ## __VA_ARGS__` drops the comma when nothing was passed
                    let is_va = mac.variadic && param(&body[j]) == Some(params.len() - 1);
                    if is_va && out.last().is_some_and(|t| t.is(",")) {
                        out.pop();
                    }
                } else if let Some(lhs) = out.pop() {
                    out.extend(lex(&format!("{}{}", lhs.text, rhs[0].text)));
                    out.extend(rhs[1..].iter().cloned());
                } else {
                    out.extend(rhs);
                }
                i = j + 1;
                continue;
            }

            if let Some(p) = param(tok) {
                let pasted = next_solid(body, i + 1).is_some_and(|j| body[j].is("##"));
                if pasted {
                    out.extend(args[p].iter().cloned());
                } else {
                    out.extend(self.expand(args[p].clone()));
                }
            } else {
                out.push(tok.clone());
            }
            i += 1;
        }
        out
    }

    /// Evaluate an `#if` expression
    fn condition(&self, expr: &str, line: u32) -> Result<bool, PreprocessError> {
        let expanded = self.expand(self.resolve_defined(lex(expr)));
        let solid: Vec<Token> = expanded.into_iter().filter(|t| !t.is_blank()).collect();

        // identifiers left after expansion are 0; so are unknown calls like __has_include(x)
        let mut tokens = Vec::with_capacity(solid.len());
        let mut i = 0;
        while i < solid.len() {
            let tok = &solid[i];
            if tok.kind != Kind::Ident {
                tokens.push(tok.clone());
                i += 1;
                continue;
            }
            let value = if tok.text == "true" { "1" } else { "0" };
            tokens.push(Token::new(Kind::Number, value));
            i += 1;
            if solid.get(i).is_some_and(|t| t.is("(")) {
                let mut depth = 0;
                while let Some(t) = solid.get(i) {
                    i += 1;
                    if t.is("(") {
                        depth += 1;
                    } else if t.is(")") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            }
        }

        let mut eval = Eval { tokens: &tokens, pos: 0 };
        let value = eval
            .expression()
            .and_then(|v| match eval.peek() {
                None => Ok(v),
                Some(extra) => Err(format!("unexpected {:?}", extra)),
            })
            .map_err(|message| PreprocessError::Expression { line, message })?;
        Ok(value != 0)
    }

    /// Replace `defined X` and `defined(X)` with 1 or 0
    fn resolve_defined(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].kind != Kind::Ident || tokens[i].text != "defined" {
                out.push(tokens[i].clone());
                i += 1;
                continue;
            }

            let mut j = next_solid(&tokens, i + 1);
            let parens = j.is_some_and(|j| tokens[j].is("("));
            if parens {
                j = j.and_then(|j| next_solid(&tokens, j + 1));
            }
            let Some(name_at) = j.filter(|&j| tokens[j].kind == Kind::Ident) else {
                out.push(tokens[i].clone());
                i += 1;
                continue;
            };

            let value = if self.is_defined(&tokens[name_at].text) { "1" } else { "0" };
            out.push(Token::new(Kind::Number, value));
            i = name_at + 1;
            if parens {
                if let Some(close) = next_solid(&tokens, i).filter(|&k| tokens[k].is(")")) {
                    i = close + 1;
                }
            }
        }
        out
    }
}

/// Precedence-climbing evaluator over integer constant expressions
struct Eval<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Eval<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|t| t.text.as_str())
    }

    fn expect(&mut self, punct: &str) -> Result<(), String> {
        match self.peek() {
            Some(p) if p == punct => {
                self.pos += 1;
                Ok(())
            }
            Some(other) => Err(format!("expected {:?}, found {:?}", punct, other)),
            None => Err(format!("expected {:?}", punct)),
        }
    }

    fn expression(&mut self) -> Result<i64, String> {
        let cond = self.binary(1)?;
        if self.peek() != Some("?") {
            return Ok(cond);
        }
        self.pos += 1;
        let then = self.expression()?;
        self.expect(":")?;
        let otherwise = self.expression()?;
        Ok(if cond != 0 { then } else { otherwise })
    }

    fn binary(&mut self, min_prec: u8) -> Result<i64, String> {
        let mut lhs = self.unary()?;
        loop {
            let Some(op) = self.peek().map(str::to_string) else {
                break;
            };
            let Some(prec) = precedence(&op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = apply(&op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<i64, String> {
        let tokens = self.tokens;
        let tok = tokens
            .get(self.pos)
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        self.pos += 1;

        match tok.kind {
            Kind::Number => parse_int(&tok.text),
            Kind::Literal => parse_char(&tok.text),
            Kind::Punct => match tok.text.as_str() {
                "!" => Ok(i64::from(self.unary()? == 0)),
                "~" => Ok(!self.unary()?),
                "-" => Ok(self.unary()?.wrapping_neg()),
                "+" => self.unary(),
                "(" => {
                    let value = self.expression()?;
                    self.expect(")")?;
                    Ok(value)
                }
                other => Err(format!("unexpected {:?}", other)),
            },
            _ => Err(format!("unexpected {:?}", tok.text)),
        }
    }
}

fn precedence(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    })
}

fn apply(op: &str, lhs: i64, rhs: i64) -> Result<i64, String> {
    Ok(match op {
        "||" => i64::from(lhs != 0 || rhs != 0),
        "&&" => i64::from(lhs != 0 && rhs != 0),
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => i64::from(lhs == rhs),
        "!=" => i64::from(lhs != rhs),
        "<" => i64::from(lhs < rhs),
        ">" => i64::from(lhs > rhs),
        "<=" => i64::from(lhs <= rhs),
        ">=" => i64::from(lhs >= rhs),
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" if rhs == 0 => return Err("division by zero".to_string()),
        "/" => lhs.wrapping_div(rhs),
        "%" => lhs.wrapping_rem(rhs),
        other => return Err(format!("unknown operator {:?}", other)),
    })
}

fn parse_int(text: &str) -> Result<i64, String> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    };
    parsed
        .map(|v| v as i64)
        .map_err(|_| format!("invalid integer {:?}", text))
}

fn parse_char(text: &str) -> Result<i64, String> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .ok_or_else(|| format!("unexpected {:?}", text))?;
    let mut chars = inner.chars();
    let value = match (chars.next(), chars.next()) {
        (Some('\\'), Some(escaped)) => match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        },
        (Some(c), _) => c,
        (None, _) => return Err("empty character constant".to_string()),
    };
    Ok(value as i64)
}

fn is_active(conds: &[Cond]) -> bool {
    conds.last().map_or(true, |c| c.active)
}

fn open_cond<'c>(conds: &'c mut [Cond], directive: &str, line: u32) -> Result<&'c mut Cond, PreprocessError> {
    match conds.last_mut() {
        Some(cond) if !cond.seen_else => Ok(cond),
        _ => Err(PreprocessError::Unbalanced {
            line,
            directive: directive.to_string(),
        }),
    }
}

fn ident_len(text: &str) -> usize {
    text.find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len())
}

fn first_ident(text: &str) -> &str {
    &text[..ident_len(text)]
}

/// Index of the next token that is not whitespace
fn next_solid(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !tokens[i].is_blank())
}

fn trim_blank(mut tokens: Vec<Token>) -> Vec<Token> {
    while tokens.last().is_some_and(Token::is_blank) {
        tokens.pop();
    }
    let lead = tokens.iter().take_while(|t| t.is_blank()).count();
    tokens.drain(..lead);
    tokens
}

/// Arguments of a function-like invocation starting at the front of `input`.
///
/// Returns the raw arguments, the number of tokens they span (including the
/// parentheses) and the newlines inside them. `None` when no `(` follows or
/// the invocation is never closed.
fn collect_args(input: &VecDeque<Token>) -> Option<(Vec<Vec<Token>>, usize, usize)> {
    let mut newlines = 0;
    let mut i = 0;
    while input.get(i)?.is_blank() {
        if input[i].kind == Kind::Newline {
            newlines += 1;
        }
        i += 1;
    }
    if !input[i].is("(") {
        return None;
    }
    i += 1;

    let mut args: Vec<Vec<Token>> = vec![Vec::new()];
    let mut depth = 0;
    loop {
        let tok = input.get(i)?;
        i += 1;
        if tok.is(")") && depth == 0 {
            break;
        }
        if tok.is(",") && depth == 0 {
            args.push(Vec::new());
            continue;
        }
        if tok.is("(") {
            depth += 1;
        } else if tok.is(")") {
            depth -= 1;
        }

        let tok = if tok.kind == Kind::Newline {
            newlines += 1;
            Token::new(Kind::Space, " ")
        } else {
            tok.clone()
        };
        if let Some(arg) = args.last_mut() {
            arg.push(tok);
        }
    }
    Some((args, i, newlines))
}

/// Match arguments to parameters, folding extra variadic arguments
fn bind_args(params: &[String], variadic: bool, mut args: Vec<Vec<Token>>) -> Option<Vec<Vec<Token>>> {
    if params.is_empty() {
        return args.iter().all(|a| a.iter().all(Token::is_blank)).then(Vec::new);
    }
    if variadic {
        if args.len() + 1 == params.len() {
            args.push(Vec::new());
        } else if args.len() > params.len() {
            let extra = args.split_off(params.len());
            let last = args.last_mut()?;
            for arg in extra {
                last.push(Token::new(Kind::Punct, ","));
                last.extend(arg);
            }
        }
    }
    (args.len() == params.len()).then(|| args.into_iter().map(trim_blank).collect())
}

fn stringify(arg: &[Token]) -> Token {
    let mut text = String::from("\"");
    for tok in arg {
        match tok.kind {
            Kind::Space | Kind::Newline => {
                if !text.ends_with(' ') && text.len() > 1 {
                    text.push(' ');
                }
            }
            Kind::Literal => {
                for c in tok.text.chars() {
                    if c == '"' || c == '\\' {
                        text.push('\\');
                    }
                    text.push(c);
                }
            }
            _ => text.push_str(&tok.text),
        }
    }
    let mut text = text.trim_end().to_string();
    text.push('"');
    Token::new(Kind::Literal, text)
}

/// Join tokens back into text, separating neighbours that would lex as one
fn render(tokens: Vec<Token>) -> String {
    let mut out = String::new();
    let mut prev: Option<Token> = None;
    for tok in tokens {
        if let Some(prev) = &prev {
            if !prev.is_blank() && !tok.is_blank() && glues(prev, &tok) {
                out.push(' ');
            }
        }
        out.push_str(&tok.text);
        prev = Some(tok);
    }
    out
}

fn glues(left: &Token, right: &Token) -> bool {
    let joined = lex(&format!("{}{}", left.text, right.text));
    joined.len() != 2 || joined[0].text != left.text
}

/// A source line after splicing backslash-newlines and removing comments
struct Line {
    text: String,
    /// First physical line number
    number: u32,
    /// Physical lines covered
    span: u32,
}

fn logical_lines(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    let mut number = 1;
    let mut span = 0;
    let mut in_comment = false;

    for (idx, physical) in source.lines().enumerate() {
        if span == 0 {
            number = idx as u32 + 1;
        }
        span += 1;
        match physical.strip_suffix('\\') {
            Some(head) => pending.push_str(head),
            None => {
                pending.push_str(physical);
                let text = strip_comments(&pending, &mut in_comment);
                lines.push(Line { text, number, span });
                pending.clear();
                span = 0;
            }
        }
    }
    if span > 0 {
        let text = strip_comments(&pending, &mut in_comment);
        lines.push(Line { text, number, span });
    }
    lines
}

fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        if *in_comment {
            if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                *in_comment = false;
                out.push(' ');
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'*') => {
                *in_comment = true;
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => break,
            '"' | '\'' => {
                let end = skip_literal(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// End index of the string or character literal starting at `start`
fn skip_literal(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

const PUNCT3: [&str; 3] = ["...", "<<=", ">>="];
const PUNCT2: [&str; 20] = [
    "##", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=",
];

fn punct_len(rest: &[char]) -> usize {
    let head: String = rest.iter().take(3).collect();
    if PUNCT3.iter().any(|p| head.starts_with(p)) {
        3
    } else if PUNCT2.iter().any(|p| head.starts_with(p)) {
        2
    } else {
        1
    }
}

/// Split one logical line into preprocessing tokens
fn lex(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let c = chars[i];
        let kind = if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            Kind::Space
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            Kind::Ident
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            i += 1;
            while i < chars.len() {
                let d = chars[i];
                if matches!(d, 'e' | 'E' | 'p' | 'P') && matches!(chars.get(i + 1), Some('+' | '-')) {
                    i += 2;
                } else if d.is_alphanumeric() || d == '.' || d == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            Kind::Number
        } else if c == '"' || c == '\'' {
            i = skip_literal(&chars, i);
            Kind::Literal
        } else {
            i += punct_len(&chars[i..]);
            Kind::Punct
        };
        let end = i.min(chars.len());
        tokens.push(Token::new(kind, chars[start..end].iter().collect::<String>()));
        i = end;
    }
    tokens
}
