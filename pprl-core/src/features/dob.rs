// pprl-core/src/features/dob.rs
//
// Date-of-birth (or any free-form date) column feature function. Splits a
// date string into three numeric components on the common separators
// (`/`, `-`, `.`), orders them according to `dayfirst`/`yearfirst`, and
// validates the result with `chrono::NaiveDate`. Parse failure — wrong
// component count, non-numeric parts, or a day/month/year combination
// `chrono` rejects (month 25, Feb 30, ...) — falls back to `default`
// locally; it never surfaces as a `PprlError`.

use chrono::NaiveDate;

use crate::table::Value;

#[derive(Debug, Clone)]
pub struct DobFeatureArgs {
    pub dayfirst: bool,
    pub yearfirst: bool,
    pub default: Vec<String>,
}

impl Default for DobFeatureArgs {
    fn default() -> Self {
        Self {
            dayfirst: true,
            yearfirst: false,
            default: vec![
                "day<01>".to_string(),
                "month<01>".to_string(),
                "year<2050>".to_string(),
            ],
        }
    }
}

fn parse_date(s: &str, args: &DobFeatureArgs) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(|c: char| matches!(c, '/' | '-' | '.')).collect();
    if parts.len() != 3 {
        return None;
    }
    let nums: Vec<i32> = parts.iter().map(|p| p.trim().parse::<i32>()).collect::<Result<_, _>>().ok()?;
    let [a, b, c] = [nums[0], nums[1], nums[2]];

    let (year, month, day) = if args.yearfirst {
        (a, if args.dayfirst { c } else { b }, if args.dayfirst { b } else { c })
    } else if args.dayfirst {
        (c, b, a)
    } else {
        (c, a, b)
    };

    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Column-kind feature function for `dob`: `["day<DD>", "month<MM>",
/// "year<YYYY>"]` on success, `args.default` on parse failure (including
/// an empty input string).
pub fn gen_dateofbirth_features(dobs: &[Value], args: &DobFeatureArgs) -> Vec<Vec<String>> {
    dobs.iter()
        .map(|v| {
            let s = v.as_feature_str();
            if s.is_empty() {
                return args.default.clone();
            }
            match parse_date(&s, args) {
                Some(date) => vec![
                    format!("day<{:02}>", date.format("%d")),
                    format!("month<{:02}>", date.format("%m")),
                    format!("year<{:04}>", date.format("%Y")),
                ],
                None => args.default.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_c_date_parsing_with_default() {
        let dobs = vec![
            Value::from("01/03/2012"),
            Value::from("12/25/1993"),
            Value::from("11/12/1960"),
            Value::from(""),
        ];
        let args = DobFeatureArgs {
            default: vec!["missing".to_string()],
            ..DobFeatureArgs::default()
        };
        let out = gen_dateofbirth_features(&dobs, &args);
        assert_eq!(
            out,
            vec![
                vec!["day<01>", "month<03>", "year<2012>"],
                vec!["missing"],
                vec!["day<11>", "month<12>", "year<1960>"],
                vec!["missing"],
            ]
        );
    }

    #[test]
    fn empty_string_uses_default() {
        let out = gen_dateofbirth_features(&[Value::Null], &DobFeatureArgs::default());
        assert_eq!(out, vec![DobFeatureArgs::default().default]);
    }
}
