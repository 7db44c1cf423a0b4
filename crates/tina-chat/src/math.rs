//! Restricted arithmetic evaluator.
//!
//! Evaluates a single expression over numbers, the operators
//! `+ - * / // % **`, parentheses, and a fixed namespace of mathematical
//! functions and constants. Nothing outside that namespace is reachable, so
//! an input like `import os` or `__import__('os')` is simply an error.
//!
//! Integer arithmetic stays integral (`2 + 2` is `4`); true division always
//! yields a float (`4 / 2` is `2.0`). Floor division and modulo round
//! toward negative infinity.
//!
//! Integers are 64-bit. A result that does not fit, such as `2 ** 64` or
//! `factorial(21)`, is a `MathError::Overflow` rather than a big integer.
//! Nesting (parentheses, unary signs, chained `**`) is capped at
//! [`MAX_DEPTH`] levels; deeper input is a `MathError::TooDeep`.

use crate::error::MathError;

/// Deepest allowed nesting of sub-expressions.
pub const MAX_DEPTH: usize = 64;

/// Evaluate `expr` and render the value.
pub fn evaluate(expr: &str) -> Result<String, MathError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(MathError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(MathError::UnexpectedToken(tok.describe()));
    }
    value.render()
}

// =============================================================================
// Values
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
        }
    }

    fn render(self) -> Result<String, MathError> {
        match self {
            Num::Int(i) => Ok(i.to_string()),
            Num::Float(f) if !f.is_finite() => Err(MathError::NonFinite),
            Num::Float(f) => Ok(format_float(f)),
        }
    }
}

/// Shortest round-trip float text with an explicit fractional part and a
/// signed, two-digit exponent (`2.0`, `0.1`, `1e+16`, `1e-05`).
fn format_float(f: f64) -> String {
    let text = format!("{:?}", f);
    match text.split_once('e') {
        None => text,
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            let mantissa = mantissa.strip_suffix(".0").unwrap_or(mantissa);
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
    }
}

fn float_to_int(f: f64) -> Result<Num, MathError> {
    if !f.is_finite() {
        return Err(MathError::NonFinite);
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(MathError::Overflow);
    }
    Ok(Num::Int(f as i64))
}

fn finite(f: f64, name: &'static str) -> Result<Num, MathError> {
    if f.is_nan() {
        Err(MathError::Domain(name))
    } else if f.is_infinite() {
        Err(MathError::NonFinite)
    } else {
        Ok(Num::Float(f))
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Name(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("'{}'", n),
            Token::Name(n) => format!("'{}'", n),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::DoubleStar => "'**'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::DoubleSlash => "'//'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, MathError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                // Exponent: e, E, optionally signed, followed by digits.
                if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].1.is_ascii_digit() {
                        while j < chars.len() && chars[j].1.is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().map(|(_, c)| c).collect();
                tokens.push(Token::Number(literal));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_')
                {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|(_, c)| c).collect();
                tokens.push(Token::Name(name));
            }
            '*' => {
                if i + 1 < chars.len() && chars[i + 1].1 == '*' {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if i + 1 < chars.len() && chars[i + 1].1 == '/' {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '+' | '-' | '%' | '(' | ')' | ',' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
                i += 1;
            }
            other => return Err(MathError::UnexpectedChar(other, offset)),
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<Num, MathError> {
    let is_float = literal.contains(['.', 'e', 'E']);
    if is_float {
        literal
            .parse::<f64>()
            .map(Num::Float)
            .map_err(|_| MathError::InvalidNumber(literal.to_string()))
    } else {
        match literal.parse::<i64>() {
            Ok(i) => Ok(Num::Int(i)),
            Err(_) if literal.chars().all(|c| c.is_ascii_digit()) => Err(MathError::Overflow),
            Err(_) => Err(MathError::InvalidNumber(literal.to_string())),
        }
    }
}

// =============================================================================
// Parser / evaluator
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), MathError> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(MathError::UnexpectedToken(tok.describe())),
            None => Err(MathError::UnexpectedEnd),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Num, MathError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = add(acc, rhs)?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = sub(acc, rhs)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<Num, MathError> {
        let mut acc = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Token::Star,
                Some(Token::Slash) => Token::Slash,
                Some(Token::DoubleSlash) => Token::DoubleSlash,
                Some(Token::Percent) => Token::Percent,
                _ => return Ok(acc),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            acc = match op {
                Token::Star => mul(acc, rhs)?,
                Token::Slash => true_div(acc, rhs)?,
                Token::DoubleSlash => floor_div(acc, rhs)?,
                _ => modulo(acc, rhs)?,
            };
        }
    }

    // unary := ('+' | '-') unary | power
    //
    // Every recursive path (parentheses, call arguments, signs, exponents)
    // passes through here, so this is where nesting is counted.
    fn unary(&mut self) -> Result<Num, MathError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(MathError::TooDeep(MAX_DEPTH));
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<Num, MathError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                negate(self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' unary)?   (right-associative, binds tighter than
    // a unary minus on its left: -2 ** 2 == -4)
    fn power(&mut self) -> Result<Num, MathError> {
        let base = self.atom()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.pos += 1;
            let exp = self.unary()?;
            return pow(base, exp);
        }
        Ok(base)
    }

    // atom := number | constant | name '(' args ')' | '(' expr ')'
    fn atom(&mut self) -> Result<Num, MathError> {
        match self.next() {
            Some(Token::Number(lit)) => parse_number(&lit),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Name(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.args()?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(tok) => Err(MathError::UnexpectedToken(tok.describe())),
            None => Err(MathError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<Num>, MathError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(tok) => return Err(MathError::UnexpectedToken(tok.describe())),
                None => return Err(MathError::UnexpectedEnd),
            }
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

fn negate(a: Num) -> Result<Num, MathError> {
    match a {
        Num::Int(i) => i.checked_neg().map(Num::Int).ok_or(MathError::Overflow),
        Num::Float(f) => Ok(Num::Float(-f)),
    }
}

fn add(a: Num, b: Num) -> Result<Num, MathError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x.checked_add(y).map(Num::Int).ok_or(MathError::Overflow),
        _ => Ok(Num::Float(a.as_f64() + b.as_f64())),
    }
}

fn sub(a: Num, b: Num) -> Result<Num, MathError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x.checked_sub(y).map(Num::Int).ok_or(MathError::Overflow),
        _ => Ok(Num::Float(a.as_f64() - b.as_f64())),
    }
}

fn mul(a: Num, b: Num) -> Result<Num, MathError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x.checked_mul(y).map(Num::Int).ok_or(MathError::Overflow),
        _ => Ok(Num::Float(a.as_f64() * b.as_f64())),
    }
}

fn true_div(a: Num, b: Num) -> Result<Num, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(Num::Float(a.as_f64() / b.as_f64()))
}

fn floor_div(a: Num, b: Num) -> Result<Num, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => {
            let q = x.checked_div(y).ok_or(MathError::Overflow)?;
            // Round toward negative infinity when the signs differ.
            if (x % y != 0) && ((x < 0) != (y < 0)) {
                Ok(Num::Int(q - 1))
            } else {
                Ok(Num::Int(q))
            }
        }
        _ => Ok(Num::Float((a.as_f64() / b.as_f64()).floor())),
    }
}

fn modulo(a: Num, b: Num) -> Result<Num, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => {
            let r = x.checked_rem(y).ok_or(MathError::Overflow)?;
            // Result takes the sign of the divisor.
            if r != 0 && ((r < 0) != (y < 0)) {
                Ok(Num::Int(r + y))
            } else {
                Ok(Num::Int(r))
            }
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let mut r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r += y;
            }
            Ok(Num::Float(r))
        }
    }
}

fn pow(base: Num, exp: Num) -> Result<Num, MathError> {
    match (base, exp) {
        (Num::Int(b), Num::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| MathError::Overflow)?;
            b.checked_pow(e).map(Num::Int).ok_or(MathError::Overflow)
        }
        _ => {
            let (b, e) = (base.as_f64(), exp.as_f64());
            if b == 0.0 && e < 0.0 {
                return Err(MathError::DivisionByZero);
            }
            if b < 0.0 && e.fract() != 0.0 {
                // Would be a complex number.
                return Err(MathError::Domain("pow"));
            }
            finite(b.powf(e), "pow")
        }
    }
}

// =============================================================================
// Namespace
// =============================================================================

fn constant(name: &str) -> Result<Num, MathError> {
    match name {
        "pi" => Ok(Num::Float(std::f64::consts::PI)),
        "e" => Ok(Num::Float(std::f64::consts::E)),
        "tau" => Ok(Num::Float(std::f64::consts::TAU)),
        n if is_function(n) => Err(MathError::NotCalled(n.to_string())),
        other => Err(MathError::UnknownName(other.to_string())),
    }
}

const FUNCTIONS: &[&str] = &[
    "sqrt", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "exp", "log", "log2", "log10",
    "pow", "floor", "ceil", "fabs", "abs", "round", "trunc", "factorial", "hypot", "degrees",
    "radians", "min", "max",
];

fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

fn arity(name: &str, args: &[Num], expected: &'static str, ok: bool) -> Result<(), MathError> {
    if ok {
        Ok(())
    } else {
        Err(MathError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn unary_float(
    name: &'static str,
    args: &[Num],
    f: impl Fn(f64) -> f64,
) -> Result<Num, MathError> {
    arity(name, args, "1", args.len() == 1)?;
    finite(f(args[0].as_f64()), name)
}

fn call(name: &str, args: &[Num]) -> Result<Num, MathError> {
    match name {
        "sqrt" => {
            arity(name, args, "1", args.len() == 1)?;
            let x = args[0].as_f64();
            if x < 0.0 {
                return Err(MathError::Domain("sqrt"));
            }
            finite(x.sqrt(), "sqrt")
        }
        "sin" => unary_float("sin", args, f64::sin),
        "cos" => unary_float("cos", args, f64::cos),
        "tan" => unary_float("tan", args, f64::tan),
        "asin" => unary_float("asin", args, f64::asin),
        "acos" => unary_float("acos", args, f64::acos),
        "atan" => unary_float("atan", args, f64::atan),
        "exp" => unary_float("exp", args, f64::exp),
        "fabs" => unary_float("fabs", args, f64::abs),
        "degrees" => unary_float("degrees", args, f64::to_degrees),
        "radians" => unary_float("radians", args, f64::to_radians),
        "log2" | "log10" => {
            arity(name, args, "1", args.len() == 1)?;
            let x = args[0].as_f64();
            if x <= 0.0 {
                return Err(MathError::Domain(if name == "log2" { "log2" } else { "log10" }));
            }
            Ok(Num::Float(if name == "log2" { x.log2() } else { x.log10() }))
        }
        "log" => {
            arity(name, args, "1 or 2", matches!(args.len(), 1 | 2))?;
            let x = args[0].as_f64();
            if x <= 0.0 {
                return Err(MathError::Domain("log"));
            }
            match args.get(1) {
                None => Ok(Num::Float(x.ln())),
                Some(base) => {
                    let b = base.as_f64();
                    if b <= 0.0 {
                        return Err(MathError::Domain("log"));
                    }
                    if b == 1.0 {
                        return Err(MathError::DivisionByZero);
                    }
                    finite(x.ln() / b.ln(), "log")
                }
            }
        }
        "atan2" | "hypot" | "pow" => {
            arity(name, args, "2", args.len() == 2)?;
            let (x, y) = (args[0].as_f64(), args[1].as_f64());
            match name {
                "atan2" => finite(x.atan2(y), "atan2"),
                "hypot" => finite(x.hypot(y), "hypot"),
                _ => {
                    if x < 0.0 && y.fract() != 0.0 {
                        return Err(MathError::Domain("pow"));
                    }
                    if x == 0.0 && y < 0.0 {
                        return Err(MathError::Domain("pow"));
                    }
                    finite(x.powf(y), "pow")
                }
            }
        }
        "floor" | "ceil" | "trunc" => {
            arity(name, args, "1", args.len() == 1)?;
            match args[0] {
                Num::Int(i) => Ok(Num::Int(i)),
                Num::Float(f) => float_to_int(match name {
                    "floor" => f.floor(),
                    "ceil" => f.ceil(),
                    _ => f.trunc(),
                }),
            }
        }
        "abs" => {
            arity(name, args, "1", args.len() == 1)?;
            match args[0] {
                Num::Int(i) => i.checked_abs().map(Num::Int).ok_or(MathError::Overflow),
                Num::Float(f) => Ok(Num::Float(f.abs())),
            }
        }
        "round" => {
            arity(name, args, "1 or 2", matches!(args.len(), 1 | 2))?;
            match (args[0], args.get(1)) {
                (Num::Int(i), None) => Ok(Num::Int(i)),
                (Num::Float(f), None) => float_to_int(f.round_ties_even()),
                (value, Some(Num::Int(digits))) => {
                    let digits = i32::try_from(*digits).map_err(|_| MathError::Overflow)?;
                    let scale = 10f64.powi(digits);
                    let rounded = (value.as_f64() * scale).round_ties_even() / scale;
                    match value {
                        Num::Int(_) if digits >= 0 => Ok(value),
                        Num::Int(_) => float_to_int(rounded),
                        Num::Float(_) => finite(rounded, "round"),
                    }
                }
                (_, Some(Num::Float(_))) => Err(MathError::Domain("round")),
            }
        }
        "factorial" => {
            arity(name, args, "1", args.len() == 1)?;
            let n = match args[0] {
                Num::Int(n) if n >= 0 => n,
                _ => return Err(MathError::Domain("factorial")),
            };
            (1..=n)
                .try_fold(1i64, |acc, k| acc.checked_mul(k))
                .map(Num::Int)
                .ok_or(MathError::Overflow)
        }
        "min" | "max" => {
            arity(name, args, "at least 2", args.len() >= 2)?;
            let mut best = args[0];
            for &candidate in &args[1..] {
                let better = if name == "min" {
                    candidate.as_f64() < best.as_f64()
                } else {
                    candidate.as_f64() > best.as_f64()
                };
                if better {
                    best = candidate;
                }
            }
            Ok(best)
        }
        n if matches!(n, "pi" | "e" | "tau") => Err(MathError::NotCallable(n.to_string())),
        other => Err(MathError::UnknownName(other.to_string())),
    }
}

// =============================================================================
// Tests
// =============================================================================
