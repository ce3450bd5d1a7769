//! One character per tick line-state notation: `0` (SE0), `J`, `K`, `1` (SE1).
//! Whitespace is ignored so bit periods can be grouped for readability.

use itertools::Itertools;
use nom::{
    branch::alt,
    character::complete::{char, multispace0},
    combinator::{all_consuming, value},
    multi::many0,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::TextError;
use crate::usb::line::LineState;

fn line_state(input: &str) -> IResult<&str, LineState> {
    alt((
        value(LineState::SE0, char('0')),
        value(LineState::J, char('J')),
        value(LineState::K, char('K')),
        value(LineState::SE1, char('1')),
    ))(input)
}

fn line_states(input: &str) -> IResult<&str, Vec<LineState>> {
    preceded(multispace0, many0(terminated(line_state, multispace0)))(input)
}

pub fn parse(input: &str) -> Result<Vec<LineState>, TextError> {
    all_consuming(line_states)(input)
        .map(|(_, states)| states)
        .map_err(|e| {
            let rest = match e {
                nom::Err::Error((rest, _)) | nom::Err::Failure((rest, _)) => rest,
                nom::Err::Incomplete(_) => "",
            };
            TextError::UnexpectedChar {
                offset: input.len() - rest.len(),
                found: rest.chars().next().unwrap_or('\0'),
            }
        })
}

/// Renders line states, inserting a space every `group` ticks (0 for no grouping).
pub fn render(states: &[LineState], group: usize) -> String {
    if group == 0 {
        return states.iter().join("");
    }
    states
        .chunks(group)
        .map(|chunk| chunk.iter().join(""))
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::line::LineState::{J, K, SE0, SE1};

    #[test]
    fn parses_all_states() {
        assert_eq!(parse("0JK1"), Ok(vec![SE0, J, K, SE1]));
    }

    #[test]
    fn ignores_whitespace() {
        assert_eq!(parse("  KKKK JJJJ\n00\t"), Ok(vec![K, K, K, K, J, J, J, J, SE0, SE0]));
        assert_eq!(parse(""), Ok(vec![]));
    }

    #[test]
    fn reports_offending_character() {
        assert_eq!(
            parse("KJ x"),
            Err(TextError::UnexpectedChar {
                offset: 3,
                found: 'x'
            })
        );
    }

    #[test]
    fn render_groups_ticks() {
        let states = vec![K, K, K, K, J, J, J, J, SE0];
        assert_eq!(render(&states, 4), "KKKK JJJJ 0");
        assert_eq!(render(&states, 0), "KKKKJJJJ0");
        assert_eq!(parse(&render(&states, 4)), Ok(states));
    }
}
