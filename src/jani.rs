//! Builders for the JANI model-interchange format.
//!
//! Every function here is a pure constructor of a JSON fragment. `render`
//! stitches the fragments for a whole [`Model`] into one document.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value, json};

use crate::error::GenerateError;
use crate::expr::Expr;
use crate::model::{Assignment, Command, Constant, Model, Objective, VarType, Variable};

const AUTOMATON: &str = "player";
const LOCATION: &str = "move";

/// Right-nested conjunction; a single operand is returned as is.
pub fn and(mut operands: Vec<Value>) -> Value {
    match operands.len() {
        0 => Value::Bool(true),
        1 => operands.remove(0),
        _ => {
            let head = operands.remove(0);
            json!({ "op": "∧", "left": head, "right": and(operands) })
        }
    }
}

/// Right-nested disjunction; a single operand is returned as is.
pub fn or(mut operands: Vec<Value>) -> Value {
    match operands.len() {
        0 => Value::Bool(false),
        1 => operands.remove(0),
        _ => {
            let head = operands.remove(0);
            json!({ "op": "∨", "left": head, "right": or(operands) })
        }
    }
}

pub fn not(exp: Value) -> Value {
    json!({ "op": "¬", "exp": exp })
}

pub fn eq(left: Value, right: Value) -> Value {
    json!({ "op": "=", "left": left, "right": right })
}

pub fn neq(left: Value, right: Value) -> Value {
    json!({ "op": "≠", "left": left, "right": right })
}

pub fn ite(cond: Value, then: Value, otherwise: Value) -> Value {
    json!({ "op": "ite", "if": cond, "then": then, "else": otherwise })
}

pub fn sub(left: Value, right: Value) -> Value {
    json!({ "op": "-", "left": left, "right": right })
}

pub fn mul(left: Value, right: Value) -> Value {
    json!({ "op": "*", "left": left, "right": right })
}

pub fn div(left: Value, right: Value) -> Value {
    json!({ "op": "/", "left": left, "right": right })
}

/// Decimals become native JSON numbers only here, at emission.
pub fn number(value: Decimal) -> Result<Value, GenerateError> {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        if let Some(int) = normalized.to_i64() {
            return Ok(Value::from(int));
        }
    }
    normalized
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| GenerateError::Numeric(value.to_string()))
}

pub fn expression(expr: &Expr) -> Result<Value, GenerateError> {
    let binary = |left: &Expr, right: &Expr, build: fn(Value, Value) -> Value| {
        Ok::<_, GenerateError>(build(expression(left)?, expression(right)?))
    };

    match expr {
        Expr::Bool(value) => Ok(Value::Bool(*value)),
        Expr::Int(value) => Ok(Value::from(*value)),
        Expr::Real(value) => number(*value),
        Expr::Var(name) => Ok(Value::String(name.clone())),
        Expr::And(operands) => Ok(and(
            operands.iter().map(expression).collect::<Result<_, _>>()?,
        )),
        Expr::Or(operands) => Ok(or(
            operands.iter().map(expression).collect::<Result<_, _>>()?,
        )),
        Expr::Not(inner) => Ok(not(expression(inner)?)),
        Expr::Eq(left, right) => binary(left, right, eq),
        Expr::Neq(left, right) => binary(left, right, neq),
        Expr::Ite(cond, then, otherwise) => Ok(ite(
            expression(cond)?,
            expression(then)?,
            expression(otherwise)?,
        )),
        Expr::Sub(left, right) => binary(left, right, sub),
        Expr::Mul(left, right) => binary(left, right, mul),
        Expr::Div(left, right) => binary(left, right, div),
    }
}

pub fn variable(var: &Variable) -> Result<Value, GenerateError> {
    let kind = match var.kind {
        VarType::Bool => json!("bool"),
        VarType::Bounded { lower, upper } => json!({
            "kind": "bounded",
            "base": "int",
            "lower-bound": lower,
            "upper-bound": upper
        }),
    };
    Ok(json!({
        "name": var.name,
        "type": kind,
        "initial-value": expression(&var.initial)?
    }))
}

pub fn constant(constant: &Constant) -> Result<Value, GenerateError> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), json!(constant.name));
    fields.insert("type".to_string(), json!("real"));
    if let Some(value) = constant.value {
        fields.insert("value".to_string(), number(value)?);
    }
    Ok(Value::Object(fields))
}

pub fn assignment(assignment: &Assignment) -> Result<Value, GenerateError> {
    Ok(json!({
        "ref": assignment.var,
        "value": expression(&assignment.value)?
    }))
}

pub fn destination(probability: Option<Value>, assignments: Vec<Value>) -> Value {
    let mut fields = Map::new();
    fields.insert("location".to_string(), json!(LOCATION));
    if let Some(probability) = probability {
        fields.insert("probability".to_string(), json!({ "exp": probability }));
    }
    fields.insert("assignments".to_string(), Value::Array(assignments));
    Value::Object(fields)
}

pub fn edge(action: Option<&str>, guard: Value, destinations: Vec<Value>) -> Value {
    let mut fields = Map::new();
    fields.insert("location".to_string(), json!(LOCATION));
    if let Some(action) = action {
        fields.insert("action".to_string(), json!(action));
    }
    fields.insert("guard".to_string(), json!({ "exp": guard }));
    fields.insert("destinations".to_string(), Value::Array(destinations));
    Value::Object(fields)
}

fn command(command: &Command) -> Result<Value, GenerateError> {
    let destinations = command
        .branches
        .iter()
        .map(|branch| -> Result<Value, GenerateError> {
            let probability = match &branch.probability {
                Some(p) => expression(p)?,
                None => Value::from(1),
            };
            let assignments = branch
                .assignments
                .iter()
                .map(assignment)
                .collect::<Result<_, _>>()?;
            Ok(destination(Some(probability), assignments))
        })
        .collect::<Result<_, _>>()?;

    Ok(edge(
        command.action.as_deref(),
        expression(&command.guard)?,
        destinations,
    ))
}

/// "Eventually reach `goal`", extremized over schedulers and evaluated from
/// the initial state.
pub fn reach_property(name: &str, goal: Value, objective: Objective) -> Value {
    let op = match objective {
        Objective::Min => "Pmin",
        Objective::Max => "Pmax",
    };
    json!({
        "name": name,
        "expression": {
            "op": "filter",
            "fun": "max",
            "values": {
                "op": op,
                "exp": { "op": "F", "exp": goal }
            },
            "states": { "op": "initial" }
        }
    })
}

pub fn render(model: &Model) -> Result<String, GenerateError> {
    let mut root = Map::new();
    root.insert("jani-version".to_string(), json!(1));
    root.insert("name".to_string(), json!("sokoban"));
    root.insert("type".to_string(), json!("mdp"));

    if !model.actions.is_empty() {
        let actions: Vec<Value> = model
            .actions
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        root.insert("actions".to_string(), Value::Array(actions));
    }

    if !model.constants.is_empty() {
        let constants = model
            .constants
            .iter()
            .map(constant)
            .collect::<Result<_, _>>()?;
        root.insert("constants".to_string(), Value::Array(constants));
    }

    let variables = model
        .variables
        .iter()
        .map(variable)
        .collect::<Result<_, _>>()?;
    root.insert("variables".to_string(), Value::Array(variables));

    root.insert(
        "properties".to_string(),
        json!([reach_property(
            "goal_reached",
            expression(&model.goal)?,
            model.objective
        )]),
    );

    let edges: Vec<Value> = model
        .commands
        .iter()
        .map(command)
        .collect::<Result<_, _>>()?;
    root.insert(
        "automata".to_string(),
        json!([{
            "name": AUTOMATON,
            "locations": [{ "name": LOCATION }],
            "initial-locations": [LOCATION],
            "edges": edges
        }]),
    );

    let mut system = Map::new();
    system.insert("elements".to_string(), json!([{ "automaton": AUTOMATON }]));
    if !model.actions.is_empty() {
        let syncs: Vec<Value> = model
            .actions
            .iter()
            .map(|name| json!({ "synchronise": [name], "result": name }))
            .collect();
        system.insert("syncs".to_string(), Value::Array(syncs));
    }
    root.insert("system".to_string(), Value::Object(system));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}
