use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::hex_digit1,
    combinator::{all_consuming, map_opt, opt},
    error::{ParseError, VerboseError},
    sequence::{pair, preceded},
    IResult,
};

fn chunk_size<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], u64, E>
where
    E: ParseError<&'a [u8]>,
{
    map_opt(hex_digit1, parse_hex)(input)
}

fn parse_hex(input: &[u8]) -> Option<u64> {
    let digits = std::str::from_utf8(input).ok()?;
    u64::from_str_radix(digits, 16).ok()
}

fn chunk_extension<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], &'a [u8], E>
where
    E: ParseError<&'a [u8]>,
{
    preceded(tag(b";"), take_while1(|_: u8| true))(input)
}

fn chunk_size_line<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], (u64, Option<&'a [u8]>), E>
where
    E: ParseError<&'a [u8]>,
{
    all_consuming(pair(chunk_size, opt(chunk_extension)))(input)
}

/// Parses a chunk-size line that has already been stripped of whitespace.
pub fn parse_chunk_size_line(
    input: &[u8],
) -> Result<(u64, Option<&[u8]>), nom::Err<VerboseError<&[u8]>>> {
    let result = chunk_size_line::<VerboseError<&[u8]>>(input)?;
    Ok(result.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_size_line() {
        assert_eq!(parse_chunk_size_line(b"0").unwrap(), (0, None));
        assert_eq!(parse_chunk_size_line(b"1A").unwrap(), (26, None));
        assert_eq!(parse_chunk_size_line(b"1a").unwrap(), (26, None));
        assert_eq!(
            parse_chunk_size_line(b"5;name=value").unwrap(),
            (5, Some(b"name=value".as_slice()))
        );

        assert!(parse_chunk_size_line(b"").is_err());
        assert!(parse_chunk_size_line(b"5;").is_err());
        assert!(parse_chunk_size_line(b"5 ;a").is_err());
        assert!(parse_chunk_size_line(b"not-hex").is_err());
        assert!(parse_chunk_size_line(b"-5").is_err());
        assert!(parse_chunk_size_line(b"10000000000000000").is_err());
    }
}
