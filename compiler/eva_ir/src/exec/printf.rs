//! `printf` formatting for the interpreter.
//!
//! Supports `%d %i %u %x %X %c %s %p %%` with `-`, `0`, `+` and space flags,
//! a field width, and ignores `h`/`l`/`z` length modifiers.

use super::memory::{Memory, RtValue};
use crate::error::ExecError;

pub(crate) fn format(
    memory: &mut Memory,
    fmt: &[u8],
    args: &[RtValue],
) -> Result<String, ExecError> {
    let mut out = String::new();
    let mut args = args.iter().copied();
    let mut i = 0;

    while i < fmt.len() {
        let b = fmt[i];
        i += 1;
        if b != b'%' {
            out.push(char::from(b));
            continue;
        }

        let mut left = false;
        let mut zero = false;
        let mut plus = false;
        let mut space = false;
        while let Some(&flag) = fmt.get(i) {
            match flag {
                b'-' => left = true,
                b'0' => zero = true,
                b'+' => plus = true,
                b' ' => space = true,
                _ => break,
            }
            i += 1;
        }
        let mut width = 0usize;
        while let Some(d) = fmt.get(i).filter(|d| d.is_ascii_digit()) {
            width = width * 10 + usize::from(d - b'0');
            i += 1;
        }
        while matches!(fmt.get(i), Some(b'h' | b'l' | b'z')) {
            i += 1;
        }
        let Some(&conv) = fmt.get(i) else {
            return Err(ExecError::BadFormat("dangling `%`".to_string()));
        };
        i += 1;

        if conv == b'%' {
            out.push('%');
            continue;
        }
        let arg = args
            .next()
            .ok_or_else(|| ExecError::BadFormat(format!("missing argument for `%{}`", char::from(conv))))?;
        let numeric = matches!(conv, b'd' | b'i' | b'u' | b'x' | b'X');
        let body = match conv {
            b'd' | b'i' => {
                let n = int_arg(arg, conv)?;
                let mut s = n.to_string();
                if n >= 0 && plus {
                    s.insert(0, '+');
                } else if n >= 0 && space {
                    s.insert(0, ' ');
                }
                s
            }
            b'u' => uint_arg(arg, conv)?.to_string(),
            b'x' => format!("{:x}", uint_arg(arg, conv)?),
            b'X' => format!("{:X}", uint_arg(arg, conv)?),
            b'c' => char::from(u8::try_from(uint_arg(arg, conv)? & 0xff).unwrap_or(b'?')).to_string(),
            b's' => match arg {
                RtValue::Ptr(p) => String::from_utf8_lossy(&memory.c_string(p)?).into_owned(),
                RtValue::Null => "(null)".to_string(),
                other => return Err(ExecError::BadFormat(format!("`%s` given {other:?}"))),
            },
            b'p' => match arg {
                RtValue::Ptr(p) => format!("0x{:x}{:08x}", p.alloc + 1, p.offset),
                _ => "(nil)".to_string(),
            },
            other => {
                return Err(ExecError::BadFormat(format!(
                    "unsupported conversion `%{}`",
                    char::from(other)
                )))
            }
        };
        pad(&mut out, &body, width, left, zero && numeric && !left);
    }
    Ok(out)
}

fn int_arg(arg: RtValue, conv: u8) -> Result<i64, ExecError> {
    arg.as_i64()
        .ok_or_else(|| ExecError::BadFormat(format!("`%{}` given {arg:?}", char::from(conv))))
}

fn uint_arg(arg: RtValue, conv: u8) -> Result<u64, ExecError> {
    arg.as_u64()
        .ok_or_else(|| ExecError::BadFormat(format!("`%{}` given {arg:?}", char::from(conv))))
}

fn pad(out: &mut String, body: &str, width: usize, left: bool, zero: bool) {
    let fill = width.saturating_sub(body.chars().count());
    if left {
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if zero {
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", body),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(body);
    }
}
