//! Checks for LaTeX formulas. They apply to MarkDown files as well, since
//! formulas are embedded there.

use super::meta::{ErrorMessage, Mistake, MistakeInput, MistakePriority, MistakeType};
use regex::Regex;
use std::sync::OnceLock;

/// Remove text commands like `\text{...}` whose content is not maths.
fn strip_text_commands(formula: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(?:text|textrm|textit|textbf|mathrm|operatorname|mbox)\s*\{[^}]*\}")
            .unwrap()
    })
    .replace_all(formula, "")
}

/// Report the first formula for which `is_wrong` holds, at its position.
fn first_formula<F>(input: &MistakeInput<'_>, message: &str, is_wrong: F) -> Option<ErrorMessage>
where
    F: Fn(&str) -> bool,
{
    let MistakeInput::Formulas(formulas) = input else {
        return None;
    };
    formulas
        .iter()
        .find(|(_, formula)| is_wrong(formula.as_str()))
        .map(|(&(line, pos), _)| ErrorMessage::at_line(message, line).with_pos(pos))
}

/// A `cases` environment needs line breaks to stay readable in the
/// alternative text.
pub struct CasesSqueezedOnOneLine;

impl Mistake for CasesSqueezedOnOneLine {
    fn name(&self) -> &'static str {
        "cases_squeezed_on_one_line"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Formulas
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["md", "tex"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        first_formula(
            input,
            "Die LaTeX-Umgebung zur Fallunterscheidung (cases) sollte Zeilenumbrüche an den \
             passenden Stellen enthalten, um die Lesbarkeit zu gewährleisten.",
            |formula| {
                formula
                    .find(r"\begin{cases}")
                    .is_some_and(|start| !formula[start..].contains('\n'))
            },
        )
    }
}

/// Matrices built by hand or written on a single line.
pub struct LaTeXMatricesAreHardToRead;

impl Mistake for LaTeXMatricesAreHardToRead {
    fn name(&self) -> &'static str {
        "latex_matrices_are_hard_to_read"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["md", "tex"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static LEFT_PAREN: OnceLock<Regex> = OnceLock::new();
        static ONE_LINE: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        let left_paren = LEFT_PAREN
            .get_or_init(|| Regex::new(r"\\left\(.*?begin\{(?:array|matrix)").unwrap());
        let one_line =
            ONE_LINE.get_or_init(|| Regex::new(r"\\begin\{.*?matrix\}.*\\\\.*&").unwrap());
        if left_paren.is_match(line) {
            Some(ErrorMessage::at_line(
                "Matrizen sollten, damit sie einfach lesbar sind, nicht mit \\left(..., \
                 sondern einfach mit \\begin{pmatrix}... erzeugt werden. Dabei werden auch \
                 Klammern automatisch gesetzt und es ist kürzer.",
                *lineno,
            ))
        } else if one_line.is_match(line) {
            Some(ErrorMessage::at_line(
                "Jede Zeile einer Matrix oder Tabelle sollte zur besseren Lesbarkeit auf eine \
                 eigene Zeile gesetzt werden.",
                *lineno,
            ))
        } else {
            None
        }
    }
}

/// Repeated `\ ` instead of `\quad` for horizontal space.
pub struct SpacingInFormulaShouldBeDoneWithQuad;

impl Mistake for SpacingInFormulaShouldBeDoneWithQuad {
    fn name(&self) -> &'static str {
        "spacing_in_formula_should_be_done_with_quad"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Formulas
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Pedantic
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["md", "tex"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"(?:\\ ){3,}").unwrap());
        first_formula(
            input,
            "Für größere Abstände in Formeln sollte \\quad oder \\qquad verwendet werden. \
             Mehrere aufeinanderfolgende \"\\ \" werden einzeln vorgelesen.",
            |formula| re.is_match(formula),
        )
    }
}

/// Function names like `sin` have to be typeset with their command.
pub struct UseProperCommandsForMathOperatorsAndFunctions;

impl Mistake for UseProperCommandsForMathOperatorsAndFunctions {
    fn name(&self) -> &'static str {
        "use_proper_commands_for_math_operators_and_functions"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Formulas
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["md", "tex"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(
                r"(?:^|[^\\A-Za-z])(arccos|arcsin|arctan|arg|cosh|cos|coth|cot|csc|deg|det|dim|exp|gcd|hom|inf|ker|lg|liminf|limsup|lim|ln|log|max|min|sec|sinh|sin|sup|tanh|tan)(?:[^A-Za-z]|$)",
            )
            .unwrap()
        });
        let MistakeInput::Formulas(formulas) = input else {
            return None;
        };
        formulas.iter().find_map(|(&(line, pos), formula)| {
            let formula = strip_text_commands(formula);
            let caps = re.captures(&formula)?;
            Some(
                ErrorMessage::at_line(
                    format!(
                        "Der Operator bzw. die Funktion \"{0}\" sollte mit \\{0} gesetzt \
                         werden, sonst wird sie wie einzelne Variablen vorgelesen.",
                        &caps[1]
                    ),
                    line,
                )
                .with_pos(pos),
            )
        })
    }
}

/// Umlauts and other non-ASCII characters are not understood by LaTeX math
/// mode; they belong into `\text{...}`.
pub struct NonAsciiCharactersInFormula;

impl Mistake for NonAsciiCharactersInFormula {
    fn name(&self) -> &'static str {
        "non_ascii_characters_in_formula"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Formulas
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["md", "tex"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Formulas(formulas) = input else {
            return None;
        };
        formulas.iter().find_map(|(&(line, pos), formula)| {
            let bad = strip_text_commands(formula).chars().find(|c| !c.is_ascii())?;
            Some(
                ErrorMessage::at_line(
                    format!(
                        "Die Formel enthält das Zeichen \"{}\", das in LaTeX-Formeln nicht \
                         verwendet werden kann. Text in Formeln muss mit \\text{{...}} gesetzt \
                         werden, Sonderzeichen mit dem passenden LaTeX-Befehl.",
                        bad
                    ),
                    line,
                )
                .with_pos(pos),
            )
        })
    }
}
