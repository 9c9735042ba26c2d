//! Standard function library.
//!
//! String helpers plus random and date content generators. Random functions
//! draw from the context PRNG so tests can pin a seed and get reproducible
//! values.

use rand::Rng;

use crate::context::TestContext;
use crate::errors::EngineError;
use crate::functions::FunctionRegistry;

pub fn register_standard_functions(registry: &mut FunctionRegistry) {
    registry.register("concat", concat);
    registry.register("upper-case", upper_case);
    registry.register("lower-case", lower_case);
    registry.register("substring", substring);
    registry.register("string-length", string_length);
    registry.register("translate", translate);
    registry.register("random-number", random_number);
    registry.register("random-string", random_string);
    registry.register("current-date", current_date);
}

fn concat(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    Ok(args.concat())
}

fn upper_case(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    single_arg("upper-case", args).map(str::to_uppercase)
}

fn lower_case(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    single_arg("lower-case", args).map(str::to_lowercase)
}

/// `substring(text, start [, end])`, zero-based, end exclusive.
fn substring(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(arity("substring", "2 or 3", args.len()));
    }
    let text = &args[0];
    let start: usize = parse_index("substring", &args[1])?;
    let end = match args.get(2) {
        Some(raw) => parse_index("substring", raw)?,
        None => text.chars().count(),
    };
    if start > end || end > text.chars().count() {
        return Err(EngineError::config(format!(
            "substring range {start}..{end} out of bounds for '{text}'"
        )));
    }
    Ok(text.chars().skip(start).take(end - start).collect())
}

fn string_length(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    single_arg("string-length", args).map(|s| s.chars().count().to_string())
}

/// `translate(text, from, to)`: character-for-character replacement.
fn translate(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    if args.len() != 3 {
        return Err(arity("translate", "3", args.len()));
    }
    let from: Vec<char> = args[1].chars().collect();
    let to: Vec<char> = args[2].chars().collect();
    Ok(args[0]
        .chars()
        .map(|c| match from.iter().position(|f| *f == c) {
            Some(i) => to.get(i).copied().unwrap_or(c),
            None => c,
        })
        .collect())
}

/// `random-number(digits)`: decimal string of exactly `digits` digits.
fn random_number(args: &[String], ctx: &mut TestContext) -> Result<String, EngineError> {
    let digits: usize = parse_index("random-number", single_arg("random-number", args)?)?;
    if digits == 0 || digits > 32 {
        return Err(EngineError::config(
            "random-number digit count must be between 1 and 32",
        ));
    }
    let rng = ctx.rng();
    let mut out = String::with_capacity(digits);
    out.push(char::from(b'1' + rng.gen_range(0..9)));
    for _ in 1..digits {
        out.push(char::from(b'0' + rng.gen_range(0..10)));
    }
    Ok(out)
}

/// `random-string(length)`: ASCII-alphabetic string of the given length.
fn random_string(args: &[String], ctx: &mut TestContext) -> Result<String, EngineError> {
    let length: usize = parse_index("random-string", single_arg("random-string", args)?)?;
    if length == 0 || length > 256 {
        return Err(EngineError::config(
            "random-string length must be between 1 and 256",
        ));
    }
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let rng = ctx.rng();
    Ok((0..length)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect())
}

/// `current-date([format])`: today's date, default format `%Y-%m-%d`.
fn current_date(args: &[String], _ctx: &mut TestContext) -> Result<String, EngineError> {
    let format = args.first().map(String::as_str).unwrap_or("%Y-%m-%d");
    Ok(chrono::Local::now().format(format).to_string())
}

fn single_arg<'a>(name: &str, args: &'a [String]) -> Result<&'a str, EngineError> {
    match args {
        [only] => Ok(only),
        _ => Err(arity(name, "1", args.len())),
    }
}

fn arity(name: &str, expected: &str, actual: usize) -> EngineError {
    EngineError::config(format!(
        "function '{name}' expects {expected} argument(s), got {actual}"
    ))
}

fn parse_index(name: &str, raw: &str) -> Result<usize, EngineError> {
    raw.trim().parse().map_err(|_| {
        EngineError::config(format!("function '{name}': '{raw}' is not a valid number"))
    })
}
