//! Builders for the PRISM guarded-command language.

use rust_decimal::Decimal;

use crate::expr::Expr;
use crate::model::{Assignment, Branch, Command, Constant, Model, VarType, Variable};

const MODULE: &str = "Player";
const INDENT: &str = "    ";

/// Binding strength of an expression, loosest first.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Ite(..) => 0,
        Expr::Or(_) => 1,
        Expr::And(_) => 2,
        Expr::Not(_) => 3,
        Expr::Eq(..) | Expr::Neq(..) => 4,
        Expr::Sub(..) => 5,
        Expr::Mul(..) | Expr::Div(..) => 6,
        Expr::Bool(_) | Expr::Int(_) | Expr::Real(_) | Expr::Var(_) => 7,
    }
}

pub fn number(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn expression(expr: &Expr) -> String {
    nested(expr, 0)
}

/// Render `expr`, parenthesized if it binds looser than `min`.
fn nested(expr: &Expr, min: u8) -> String {
    let text = match expr {
        Expr::Bool(value) => value.to_string(),
        Expr::Int(value) => value.to_string(),
        Expr::Real(value) => number(*value),
        Expr::Var(name) => name.clone(),
        Expr::And(operands) => operands
            .iter()
            .map(|e| nested(e, 2))
            .collect::<Vec<_>>()
            .join(" & "),
        // Conjunctions inside a disjunction are bracketed for readability.
        Expr::Or(operands) => operands
            .iter()
            .map(|e| nested(e, 3))
            .collect::<Vec<_>>()
            .join(" | "),
        Expr::Not(inner) => format!("!{}", nested(inner, 3)),
        Expr::Eq(left, right) => format!("{}={}", nested(left, 5), nested(right, 5)),
        Expr::Neq(left, right) => format!("{}!={}", nested(left, 5), nested(right, 5)),
        Expr::Ite(cond, then, otherwise) => format!(
            "{} ? {} : {}",
            nested(cond, 1),
            nested(then, 1),
            nested(otherwise, 0)
        ),
        Expr::Sub(left, right) => format!("{}-{}", nested(left, 5), nested(right, 6)),
        Expr::Mul(left, right) => format!("{}*{}", nested(left, 6), nested(right, 7)),
        Expr::Div(left, right) => format!("{}/{}", nested(left, 6), nested(right, 7)),
    };

    if precedence(expr) < min {
        format!("({})", text)
    } else {
        text
    }
}

pub fn variable(var: &Variable) -> String {
    match var.kind {
        VarType::Bool => format!("{}: bool init {};", var.name, expression(&var.initial)),
        VarType::Bounded { lower, upper } => format!(
            "{}: [{}..{}] init {};",
            var.name,
            lower,
            upper,
            expression(&var.initial)
        ),
    }
}

pub fn constant(constant: &Constant) -> String {
    match constant.value {
        Some(value) => format!("const double {} = {};", constant.name, number(value)),
        None => format!("const double {};", constant.name),
    }
}

pub fn label(name: &str, expr: &Expr) -> String {
    format!("label \"{}\" = {};", name, expression(expr))
}

/// `(x'=1) & (y'=2)`, or `true` when nothing changes.
pub fn update(assignments: &[Assignment]) -> String {
    if assignments.is_empty() {
        return "true".to_string();
    }
    assignments
        .iter()
        .map(|a| format!("({}'={})", a.var, expression(&a.value)))
        .collect::<Vec<_>>()
        .join(" & ")
}

fn branch(branch: &Branch) -> String {
    match &branch.probability {
        Some(p) => format!("{}:{}", nested(p, 5), update(&branch.assignments)),
        None => update(&branch.assignments),
    }
}

/// `[action] guard -> p1:update1 + p2:update2;`
pub fn command(command: &Command) -> String {
    let branches = command
        .branches
        .iter()
        .map(branch)
        .collect::<Vec<_>>()
        .join(" + ");
    format!(
        "[{}] {} -> {};",
        command.action.as_deref().unwrap_or(""),
        expression(&command.guard),
        branches
    )
}

pub fn module(name: &str, variables: &[Variable], commands: &[Command]) -> String {
    let mut lines = vec![format!("module {}", name)];
    lines.extend(variables.iter().map(|v| format!("{}{}", INDENT, variable(v))));
    lines.push(String::new());
    lines.extend(commands.iter().map(|c| format!("{}{}", INDENT, command(c))));
    lines.push("endmodule".to_string());
    lines.join("\n")
}

pub fn render(model: &Model) -> String {
    let mut sections = Vec::new();

    if let Some(comment) = &model.comment {
        let header = comment
            .lines()
            .map(|line| format!("// {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(header);
    }

    sections.push("mdp".to_string());
    sections.push(label("goal_reached", &model.goal));

    if !model.constants.is_empty() {
        sections.push(
            model
                .constants
                .iter()
                .map(constant)
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    sections.push(module(MODULE, &model.variables, &model.commands));

    if model.rewards {
        sections.push(format!("rewards\n{}true : 1;\nendrewards", INDENT));
    }

    let mut output = sections.join("\n\n");
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expr::{and, div, eq, ite, neq, not, or, sub, var};

    #[test]
    fn test_guard_rendering() {
        let guard = and([eq(var("position"), 6usize), not(var("box_7"))]);
        assert_eq!(expression(&guard), "position=6 & !box_7");
    }

    #[test]
    fn test_not_brackets_conjunction() {
        let guard = not(and([var("box_7"), var("box_8")]));
        assert_eq!(expression(&guard), "!(box_7 & box_8)");
    }

    #[test]
    fn test_or_of_ands() {
        let goal = or([
            and([eq(var("box_0"), 3usize), eq(var("box_1"), 5usize)]),
            and([eq(var("box_0"), 5usize), eq(var("box_1"), 3usize)]),
        ]);
        assert_eq!(
            expression(&goal),
            "(box_0=3 & box_1=5) | (box_0=5 & box_1=3)"
        );
    }

    #[test]
    fn test_noise_probabilities() {
        let residual = div(sub(1usize, var("mu")), 2usize);
        assert_eq!(expression(&residual), "(1-mu)/2");
        assert_eq!(expression(&sub(1usize, var("mu"))), "1-mu");
    }

    #[test]
    fn test_update_with_ite() {
        let assignments = vec![Assignment::new(
            "position",
            ite(not(var("box_7")), 7usize, var("position")),
        )];
        assert_eq!(update(&assignments), "(position'=!box_7 ? 7 : position)");
        assert_eq!(update(&[]), "true");
    }

    #[test]
    fn test_command_single_branch() {
        let cmd = Command {
            action: Some("right".to_string()),
            guard: and([eq(var("position"), 11usize), neq(var("box_0"), 12usize)]),
            branches: vec![Branch {
                probability: None,
                assignments: vec![Assignment::new("position", 12usize)],
            }],
        };
        assert_eq!(
            command(&cmd),
            "[right] position=11 & box_0!=12 -> (position'=12);"
        );
    }

    #[test]
    fn test_command_weighted_branches() {
        let cmd = Command {
            action: None,
            guard: eq(var("position"), 6usize),
            branches: vec![
                Branch {
                    probability: Some(Decimal::new(75, 2).into()),
                    assignments: vec![Assignment::new("position", 7usize)],
                },
                Branch {
                    probability: Some(Decimal::new(25, 2).into()),
                    assignments: vec![],
                },
            ],
        };
        assert_eq!(
            command(&cmd),
            "[] position=6 -> 0.75:(position'=7) + 0.25:true;"
        );
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            variable(&Variable::boolean("box_12", true)),
            "box_12: bool init true;"
        );
        assert_eq!(
            variable(&Variable::bounded("position", 6, 13, 6)),
            "position: [6..13] init 6;"
        );
        let mu = Constant {
            name: "mu".to_string(),
            value: Some(Decimal::new(90, 2)),
        };
        assert_eq!(constant(&mu), "const double mu = 0.9;");
    }
}
