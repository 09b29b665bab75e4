//! SVG path sampler.
//!
//! Flattens the `M/L/H/V/Q/C/Z` subset of SVG path data (absolute and
//! relative) into a dense polyline. Bezier segments are sampled at
//! [`CURVE_SEGMENTS`] uniform parameter steps. Parsing is permissive:
//! unsupported commands, unparsable tokens and commands missing arguments
//! are skipped.

use crate::geometry::Point;

/// Number of line segments each quadratic or cubic curve is flattened into.
pub const CURVE_SEGMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
    Invalid,
}

/// Split path data into command letters and numbers.
///
/// Separators are whitespace and commas. A `-` that does not follow an
/// exponent marker also starts a new number, so `10-5` reads as two values.
fn tokenize(path_data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    fn flush(current: &mut String, tokens: &mut Vec<Token>) {
        if !current.is_empty() {
            tokens.push(match current.parse::<f64>() {
                Ok(v) if v.is_finite() => Token::Number(v),
                _ => Token::Invalid,
            });
            current.clear();
        }
    }

    for ch in path_data.chars() {
        match ch {
            'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q'
            | 'q' | 'T' | 't' | 'A' | 'a' | 'Z' | 'z' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Command(ch));
            }
            ' ' | ',' | '\n' | '\r' | '\t' => flush(&mut current, &mut tokens),
            '-' if !current.is_empty() && !current.ends_with(['e', 'E']) => {
                flush(&mut current, &mut tokens);
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

/// Take exactly `N` consecutive numbers starting at `*i`, advancing past them.
fn take_numbers<const N: usize>(tokens: &[Token], i: &mut usize) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (k, slot) in out.iter_mut().enumerate() {
        match tokens.get(*i + k) {
            Some(Token::Number(v)) => *slot = *v,
            _ => return None,
        }
    }
    *i += N;
    Some(out)
}

fn quadratic(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * c.x + t * t * p1.x,
        mt * mt * p0.y + 2.0 * mt * t * c.y + t * t * p1.y,
    )
}

fn cubic(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p1.x,
        a * p0.y + b * c1.y + c * c2.y + d * p1.y,
    )
}

struct Sampler {
    points: Vec<Point>,
    current: Point,
    subpath_start: Point,
}

impl Sampler {
    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    /// Drawing commands before any `M` start from the current point.
    fn ensure_started(&mut self) {
        if self.points.is_empty() {
            self.points.push(self.current);
        }
    }

    fn move_to(&mut self, p: Point) {
        self.current = p;
        self.subpath_start = p;
        self.points.push(p);
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.current = p;
        self.points.push(p);
    }

    fn quad_to(&mut self, c: Point, end: Point) {
        self.ensure_started();
        let start = self.current;
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            self.points.push(quadratic(start, c, end, t));
        }
        self.current = end;
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.ensure_started();
        let start = self.current;
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            self.points.push(cubic(start, c1, c2, end, t));
        }
        self.current = end;
    }

    fn close(&mut self) {
        if self.points.is_empty() {
            return;
        }
        if self.current != self.subpath_start {
            self.points.push(self.subpath_start);
        }
        self.current = self.subpath_start;
    }
}

/// Parse SVG path data into a point sequence.
///
/// Curves contribute [`CURVE_SEGMENTS`] points each (the start point is the
/// previous current point). `Z` appends the subpath start when the pen is
/// not already there.
pub fn parse_path(path_data: &str) -> Vec<Point> {
    let tokens = tokenize(path_data);
    let mut s = Sampler {
        points: Vec::new(),
        current: Point::default(),
        subpath_start: Point::default(),
    };

    let mut i = 0;
    while i < tokens.len() {
        let Token::Command(cmd) = tokens[i] else {
            // stray number or garbage
            i += 1;
            continue;
        };
        i += 1;
        let relative = cmd.is_ascii_lowercase();

        match cmd.to_ascii_uppercase() {
            'M' => {
                let Some([x, y]) = take_numbers(&tokens, &mut i) else {
                    continue;
                };
                let p = s.resolve(relative, x, y);
                s.move_to(p);
                // Extra pairs after a moveto are implicit linetos.
                while let Some([x, y]) = take_numbers(&tokens, &mut i) {
                    let p = s.resolve(relative, x, y);
                    s.line_to(p);
                }
            }
            'L' => {
                while let Some([x, y]) = take_numbers(&tokens, &mut i) {
                    let p = s.resolve(relative, x, y);
                    s.line_to(p);
                }
            }
            'H' => {
                while let Some([x]) = take_numbers(&tokens, &mut i) {
                    let nx = if relative { s.current.x + x } else { x };
                    s.line_to(Point::new(nx, s.current.y));
                }
            }
            'V' => {
                while let Some([y]) = take_numbers(&tokens, &mut i) {
                    let ny = if relative { s.current.y + y } else { y };
                    s.line_to(Point::new(s.current.x, ny));
                }
            }
            'Q' => {
                while let Some([cx, cy, x, y]) = take_numbers(&tokens, &mut i) {
                    let c = s.resolve(relative, cx, cy);
                    let end = s.resolve(relative, x, y);
                    s.quad_to(c, end);
                }
            }
            'C' => {
                while let Some([c1x, c1y, c2x, c2y, x, y]) = take_numbers(&tokens, &mut i) {
                    let c1 = s.resolve(relative, c1x, c1y);
                    let c2 = s.resolve(relative, c2x, c2y);
                    let end = s.resolve(relative, x, y);
                    s.cubic_to(c1, c2, end);
                }
            }
            'Z' => s.close(),
            other => {
                tracing::debug!("skipping unsupported path command '{other}'");
            }
        }
    }

    s.points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line() {
        assert_eq!(
            parse_path("M 0 0 L 10 0"),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]
        );
    }

    #[test]
    fn quadratic_curve_is_flattened() {
        let pts = parse_path("M 0 0 Q 5 10 10 0");
        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0], Point::new(0.0, 0.0));
        assert_eq!(pts[10], Point::new(10.0, 0.0));
        // apex of the curve at t = 0.5
        assert!((pts[5].x - 5.0).abs() < 1e-9);
        assert!((pts[5].y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_curve_is_flattened() {
        let pts = parse_path("M0,0 C0,10 10,10 10,0");
        assert_eq!(pts.len(), 1 + CURVE_SEGMENTS);
        assert_eq!(*pts.last().unwrap(), Point::new(10.0, 0.0));
    }

    #[test]
    fn relative_commands() {
        let pts = parse_path("m 10 10 l 5 0 h 5 v -5 q 0 -5 5 -5");
        assert_eq!(pts[0], Point::new(10.0, 10.0));
        assert_eq!(pts[1], Point::new(15.0, 10.0));
        assert_eq!(pts[2], Point::new(20.0, 10.0));
        assert_eq!(pts[3], Point::new(20.0, 5.0));
        assert_eq!(*pts.last().unwrap(), Point::new(25.0, 0.0));
    }

    #[test]
    fn close_appends_subpath_start() {
        let pts = parse_path("M 0 0 L 10 0 L 10 10 Z");
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[3], Point::new(0.0, 0.0));

        // already at the start: nothing appended
        let pts = parse_path("M 0 0 L 10 0 L 0 0 Z");
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn implicit_repeats_and_moveto_pairs() {
        let pts = parse_path("M 0 0 10 0 L 10 10 0 10");
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn permissive_on_garbage() {
        let pts = parse_path("M 0 0 L foo 3 A 1 1 0 0 1 5 5 L 10 0 Q 1");
        assert_eq!(pts, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(parse_path("").is_empty());
        assert!(parse_path("hello world").is_empty());
    }

    #[test]
    fn compact_negative_numbers() {
        let pts = parse_path("M10-5L20-5");
        assert_eq!(pts, vec![Point::new(10.0, -5.0), Point::new(20.0, -5.0)]);
    }
}
