//! Splits an SDNA member spelling (e.g. `*next`, `drw_corners[2][4][2]`,
//! `(*func)()`) into an identifier, a pointer-indirection count, and array
//! dimensions.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_until},
    error::{ErrorKind, ParseError},
    multi::{many0, many1},
    sequence::delimited,
    Err, IResult,
};

#[derive(Debug)]
pub enum NameParseError {
    Nom(ErrorKind),
    InvalidArraySize,
}

impl ParseError<&str> for NameParseError {
    fn from_error_kind(_input: &str, kind: ErrorKind) -> Self {
        NameParseError::Nom(kind)
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type Result<'a, T> = IResult<&'a str, T, NameParseError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSpelling {
    Value {
        name: String,
        dims: Vec<usize>,
    },
    Pointer {
        name: String,
        pointer_depth: usize,
        dims: Vec<usize>,
    },
    FnPointer {
        name: String,
    },
}

fn fn_pointer(input: &str) -> Result<ParsedSpelling> {
    let (input, name) = delimited(tag("(*"), take_until(")"), tag(")"))(input)?;
    let (input, _) = delimited(tag("("), take_until(")"), tag(")"))(input)?;
    Ok((
        input,
        ParsedSpelling::FnPointer {
            name: name.to_owned(),
        },
    ))
}

fn array_dims(input: &str) -> Result<Vec<usize>> {
    let (input, raw) = many0(delimited(tag("["), take_until("]"), tag("]")))(input)?;

    let mut dims = Vec::with_capacity(raw.len());
    for dim in raw {
        dims.push(
            dim.parse::<usize>()
                .map_err(|_| Err::Failure(NameParseError::InvalidArraySize))?,
        );
    }

    Ok((input, dims))
}

fn pointer(input: &str) -> Result<ParsedSpelling> {
    let (input, asterisks) = many1(tag("*"))(input)?;
    let (input, name) = take_till(|c| c == '[')(input)?;

    if input.is_empty() {
        Ok((
            input,
            ParsedSpelling::Pointer {
                name: name.to_owned(),
                pointer_depth: asterisks.len(),
                dims: Vec::new(),
            },
        ))
    } else {
        let (input, dims) = array_dims(input)?;
        Ok((
            input,
            ParsedSpelling::Pointer {
                name: name.to_owned(),
                pointer_depth: asterisks.len(),
                dims,
            },
        ))
    }
}

fn value(input: &str) -> Result<ParsedSpelling> {
    let (input, name) = take_till(|c| c == '[')(input)?;

    if input.is_empty() {
        Ok((
            input,
            ParsedSpelling::Value {
                name: name.to_owned(),
                dims: Vec::new(),
            },
        ))
    } else {
        let (input, dims) = array_dims(input)?;
        Ok((
            input,
            ParsedSpelling::Value {
                name: name.to_owned(),
                dims,
            },
        ))
    }
}

/// Parses one NAME-table entry. Fails if the spelling matches neither the
/// principal pattern nor the function-pointer fallback.
pub fn parse_spelling(input: &str) -> std::result::Result<ParsedSpelling, NameParseError> {
    match alt((fn_pointer, pointer, value))(input) {
        Ok((_, spelling)) => Ok(spelling),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(e),
        Err(Err::Incomplete(_)) => Err(NameParseError::Nom(ErrorKind::Eof)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pointer() {
        assert_eq!(
            parse_spelling("*next").unwrap(),
            ParsedSpelling::Pointer {
                name: "next".to_owned(),
                pointer_depth: 1,
                dims: Vec::new(),
            }
        );
    }

    #[test]
    fn parses_multidimensional_array() {
        assert_eq!(
            parse_spelling("drw_corners[2][4][2]").unwrap(),
            ParsedSpelling::Value {
                name: "drw_corners".to_owned(),
                dims: vec![2, 4, 2],
            }
        );
    }

    #[test]
    fn parses_function_pointer() {
        assert_eq!(
            parse_spelling("(*func)()").unwrap(),
            ParsedSpelling::FnPointer {
                name: "func".to_owned(),
            }
        );
    }

    #[test]
    fn parses_plain_value() {
        assert_eq!(
            parse_spelling("flag").unwrap(),
            ParsedSpelling::Value {
                name: "flag".to_owned(),
                dims: Vec::new(),
            }
        );
    }
}
