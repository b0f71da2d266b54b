// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text fragment cleanup and layer/name normalization
//!
//! Raw label text arrives with inline formatting baggage: `{...}` override
//! groups where only the last `;`-separated payload is real content,
//! `\X...;` formatting codes, `\P` paragraph breaks, and comma decimal
//! separators. Everything here is garbage-tolerant; malformed markup is
//! dropped, never an error.

/// Strip inline formatting from a raw text fragment.
///
/// - `{...}` groups collapse to the last non-empty `;`-separated payload
/// - `\P` becomes a space
/// - `\X...;` codes (font, height, alignment, ...) are removed
/// - commas become stops (the drawings use comma decimal separators)
/// - whitespace is collapsed
pub fn clean_fragment(raw: &str) -> String {
    let stripped = strip_markup(raw);
    let mut out = String::with_capacity(stripped.len());
    for part in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

fn strip_markup(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j] != '}' {
                    j += 1;
                }
                let group: String = chars[i + 1..j].iter().collect();
                // Override groups stack codes before the payload; the last
                // non-empty segment is the visible text.
                let payload = group
                    .rsplit(';')
                    .map(str::trim)
                    .find(|p| !p.is_empty())
                    .unwrap_or("");
                if !payload.is_empty() {
                    if !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                    out.push_str(&strip_markup(payload));
                }
                i = j + 1;
            }
            '}' => i += 1,
            '\\' => match chars.get(i + 1) {
                Some('P') => {
                    out.push(' ');
                    i += 2;
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    // Formatting code, consumed through its ';' terminator
                    // when one exists before the next markup boundary.
                    let mut j = i + 2;
                    while j < chars.len()
                        && chars[j] != ';'
                        && chars[j] != '\\'
                        && chars[j] != '{'
                        && chars[j] != '}'
                    {
                        j += 1;
                    }
                    if chars.get(j) == Some(&';') {
                        j += 1;
                    }
                    i = j;
                }
                _ => i += 1,
            },
            ',' => {
                out.push('.');
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Last `$`-separated segment of a qualified layer name.
///
/// Planning exports qualify layers as `Vorplanung$...$ADE_ET_X-TXT`; only
/// the final segment carries meaning for fusion.
pub fn final_layer_segment(layer: &str) -> &str {
    layer.rsplit('$').next().unwrap_or(layer)
}

/// Drop the trailing `-XXX` part of a layer name, if any.
pub fn strip_last_dash_part(s: &str) -> &str {
    match s.rfind('-') {
        Some(idx) => &s[..idx],
        None => s,
    }
}

/// Leading `_`-separated token of a block name's final `$` segment.
///
/// `Vorplanung$Kabelkanal_A01KSXVQXE` reduces to `Kabelkanal`.
pub fn name_prefix(name: &str) -> &str {
    let last = name.rsplit('$').next().unwrap_or(name);
    last.split('_').next().unwrap_or(last)
}
