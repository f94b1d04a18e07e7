//! Unicode (LDML) date patterns compiled to chrono format items.
//!
//! Record producers describe dates with the same patterns the host platform's
//! date formatters use (`yyyy-MM-dd'T'HH:mm:ssZZZZZ`). A pattern is compiled
//! once and then used in both directions, so a string parsed with a pattern
//! formats back to the same string.

use crate::error::{SchemaError, SchemaResult};
use chrono::format::{self, Fixed, Item, Numeric, Pad, Parsed};
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone};
use std::fmt;

/// Pattern used for date attributes that carry no format of their own.
pub const DEFAULT_IMPORT_DATE_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ssZZZZZ";

/// A compiled date pattern.
#[derive(Clone)]
pub struct DateFormat {
    pattern: String,
    items: Vec<Item<'static>>,
    has_time: bool,
    has_offset: bool,
}

enum Field {
    Item(Item<'static>),
    Offset(Item<'static>),
    GmtOffset,
    Fraction(usize),
}

impl DateFormat {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> SchemaResult<Self> {
        let invalid = |reason: String| SchemaError::InvalidDateFormat {
            pattern: pattern.to_string(),
            reason,
        };

        let chars: Vec<char> = pattern.chars().collect();
        let mut items = Vec::new();
        let mut literal = String::new();
        let mut has_time = false;
        let mut has_offset = false;
        let mut has_hour12 = false;
        let mut has_am_pm = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    literal.push('\'');
                    i += 2;
                    continue;
                }
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated quoted literal".into())),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            literal.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            literal.push(ch);
                            i += 1;
                        }
                    }
                }
                continue;
            }

            if !c.is_ascii_alphabetic() {
                literal.push(c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&ch| ch == c).count();
            i += run;

            let field = field_for(c, run)
                .ok_or_else(|| invalid(format!("unsupported field {}", c.to_string().repeat(run))))?;
            if matches!(c, 'H' | 'h' | 'm' | 's' | 'S' | 'a') {
                has_time = true;
            }
            has_hour12 |= c == 'h';
            has_am_pm |= c == 'a';

            match field {
                Field::Fraction(digits) => {
                    // chrono's fixed-width fractions carry their own leading dot
                    if !literal.ends_with('.') {
                        return Err(invalid("fractional seconds must follow '.'".into()));
                    }
                    literal.pop();
                    flush_literal(&mut items, &mut literal);
                    items.push(Item::Fixed(match digits {
                        3 => Fixed::Nanosecond3,
                        6 => Fixed::Nanosecond6,
                        _ => Fixed::Nanosecond9,
                    }));
                }
                Field::Item(item) => {
                    flush_literal(&mut items, &mut literal);
                    items.push(item);
                }
                Field::Offset(item) => {
                    has_offset = true;
                    flush_literal(&mut items, &mut literal);
                    items.push(item);
                }
                Field::GmtOffset => {
                    has_offset = true;
                    literal.push_str("GMT");
                    flush_literal(&mut items, &mut literal);
                    items.push(Item::Fixed(Fixed::TimezoneOffsetColon));
                }
            }
        }
        flush_literal(&mut items, &mut literal);

        // a 12-hour clock cannot resolve to a time without the AM/PM marker
        if has_hour12 && !has_am_pm {
            return Err(invalid("'h' requires an 'a' field".into()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            items,
            has_time,
            has_offset,
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parses `input`, returning `None` when it does not match the pattern.
    ///
    /// Patterns without a zone field are read as UTC; patterns without a time
    /// field are read as midnight.
    pub fn parse(&self, input: &str) -> Option<DateTime<FixedOffset>> {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, input, self.items.iter()).ok()?;

        let date = parsed.to_naive_date().ok()?;
        let time = if self.has_time {
            parsed.to_naive_time().ok()?
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)?
        };
        let offset = if self.has_offset {
            parsed.to_fixed_offset().ok()?
        } else {
            FixedOffset::east_opt(0)?
        };
        offset.from_local_datetime(&date.and_time(time)).single()
    }

    /// Formats `date` with this pattern.
    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        date.format_with_items(self.items.iter()).to_string()
    }
}

impl fmt::Debug for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DateFormat").field(&self.pattern).finish()
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

fn flush_literal(items: &mut Vec<Item<'static>>, literal: &mut String) {
    if !literal.is_empty() {
        items.push(Item::OwnedLiteral(std::mem::take(literal).into_boxed_str()));
    }
}

fn numeric(n: Numeric, zero_padded: bool) -> Field {
    let pad = if zero_padded { Pad::Zero } else { Pad::None };
    Field::Item(Item::Numeric(n, pad))
}

fn field_for(c: char, run: usize) -> Option<Field> {
    let field = match (c, run) {
        ('y', 2) => numeric(Numeric::YearMod100, true),
        ('y', 1) => numeric(Numeric::Year, false),
        ('y', _) => numeric(Numeric::Year, true),
        ('M', 1) => numeric(Numeric::Month, false),
        ('M', 2) => numeric(Numeric::Month, true),
        ('M', 3) => Field::Item(Item::Fixed(Fixed::ShortMonthName)),
        ('M', 4) => Field::Item(Item::Fixed(Fixed::LongMonthName)),
        ('d', 1) => numeric(Numeric::Day, false),
        ('d', 2) => numeric(Numeric::Day, true),
        ('D', 1..=3) => numeric(Numeric::Ordinal, run > 1),
        ('E', 1..=3) => Field::Item(Item::Fixed(Fixed::ShortWeekdayName)),
        ('E', 4) => Field::Item(Item::Fixed(Fixed::LongWeekdayName)),
        ('H', 1) => numeric(Numeric::Hour, false),
        ('H', 2) => numeric(Numeric::Hour, true),
        ('h', 1) => numeric(Numeric::Hour12, false),
        ('h', 2) => numeric(Numeric::Hour12, true),
        ('a', 1) => Field::Item(Item::Fixed(Fixed::UpperAmPm)),
        ('m', 1) => numeric(Numeric::Minute, false),
        ('m', 2) => numeric(Numeric::Minute, true),
        ('s', 1) => numeric(Numeric::Second, false),
        ('s', 2) => numeric(Numeric::Second, true),
        ('S', 3 | 6 | 9) => Field::Fraction(run),
        ('Z', 1..=3) | ('x', 2 | 4) => Field::Offset(Item::Fixed(Fixed::TimezoneOffset)),
        ('Z', 4) => Field::GmtOffset,
        ('Z', 5) | ('X', 3 | 5) => Field::Offset(Item::Fixed(Fixed::TimezoneOffsetColonZ)),
        ('X', 2 | 4) => Field::Offset(Item::Fixed(Fixed::TimezoneOffsetZ)),
        ('x', 3 | 5) => Field::Offset(Item::Fixed(Fixed::TimezoneOffsetColon)),
        _ => return None,
    };
    Some(field)
}
