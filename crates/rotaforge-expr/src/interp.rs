//! Tree-walking evaluation of programs against a solver model.

use std::collections::HashMap;
use std::mem;

use rotaforge_core::{VarKey, RESERVED_SYMBOLS};
use rotaforge_milp::{LinExpr, LinearConstraint, Model, ObjectiveSense, Sense, VarType};
use tracing::debug;

use crate::ast::{BinaryOp, Comprehension, Expr, Program, Stmt, StmtKind, UnaryOp};
use crate::container::{ContainerSet, VarContainer};
use crate::error::{ExprError, ExprResult};
use crate::parser::{parse, BUILTINS};
use crate::symbols::Symbols;
use crate::value::Value;

/// What a program is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Container declarations only
    Schema,
    /// Constraints and auxiliary containers
    Constraint,
    /// Exactly one objective, plus auxiliary containers and constraints
    Objective,
}

/// Resource budget of one program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Evaluated statements, expression nodes and generated elements
    pub max_steps: u64,
    pub max_constraints: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_constraints: 100_000,
        }
    }
}

/// What a successful run added to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    /// Names of the constraints added, in order
    pub constraints: Vec<String>,
    /// Names of the containers declared, in order
    pub containers: Vec<String>,
    pub objective: Option<ObjectiveSense>,
    pub steps: u64,
}

/// Runs programs with read access to specification symbols and write access to
/// one model and its containers.
///
/// A failed run leaves the model, its objective and the container set exactly as
/// they were before.
#[derive(Debug, Clone)]
pub struct Sandbox<'s> {
    symbols: &'s Symbols,
    limits: Limits,
}

impl<'s> Sandbox<'s> {
    pub fn new(symbols: &'s Symbols, limits: Limits) -> Self {
        Self { symbols, limits }
    }

    /// Parses and executes `source`.
    pub fn run(
        &self,
        source: &str,
        mode: Mode,
        model: &mut Model,
        containers: &mut ContainerSet,
    ) -> ExprResult<Execution> {
        let program = parse(source)?;
        self.execute(&program, mode, model, containers)
    }

    pub fn execute(
        &self,
        program: &Program,
        mode: Mode,
        model: &mut Model,
        containers: &mut ContainerSet,
    ) -> ExprResult<Execution> {
        let checkpoint = model.checkpoint();
        let objective = model.objective().clone();
        let container_count = containers.len();

        let result = {
            let mut interp = Interpreter {
                symbols: self.symbols,
                limits: self.limits,
                mode,
                model: &mut *model,
                containers: &mut *containers,
                scopes: vec![HashMap::new()],
                steps: 0,
                line: 1,
                execution: Execution::default(),
            };
            match interp.program(program) {
                Ok(()) => {
                    interp.execution.steps = interp.steps;
                    Ok(interp.execution)
                }
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(execution) => {
                debug!(
                    component = "expr",
                    operation = "execute",
                    mode = ?mode,
                    constraints = execution.constraints.len(),
                    containers = execution.containers.len(),
                    steps = execution.steps,
                    "program executed"
                );
                Ok(execution)
            }
            Err(e) => {
                model.rollback(checkpoint);
                model.set_objective(objective.expr, objective.sense);
                containers.truncate(container_count);
                debug!(component = "expr", operation = "execute", mode = ?mode, error = %e, "program rolled back");
                Err(e)
            }
        }
    }
}

struct Interpreter<'a> {
    symbols: &'a Symbols,
    limits: Limits,
    mode: Mode,
    model: &'a mut Model,
    containers: &'a mut ContainerSet,
    scopes: Vec<HashMap<String, Value>>,
    steps: u64,
    line: usize,
    execution: Execution,
}

impl<'a> Interpreter<'a> {
    fn err(&self, message: impl Into<String>) -> ExprError {
        ExprError::eval(self.line, message)
    }

    fn step(&mut self) -> ExprResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ExprError::StepLimit(self.limits.max_steps));
        }
        Ok(())
    }

    fn program(&mut self, program: &Program) -> ExprResult<()> {
        self.block(&program.stmts)?;
        if self.mode == Mode::Objective && self.execution.objective.is_none() {
            return Err(self.err("objective code must contain a 'minimize' or 'maximize' statement"));
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[Stmt]) -> ExprResult<()> {
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn scoped<T>(&mut self, bindings: HashMap<String, Value>, f: impl FnOnce(&mut Self) -> ExprResult<T>) -> ExprResult<T> {
        self.scopes.push(bindings);
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn statement(&mut self, stmt: &Stmt) -> ExprResult<()> {
        self.line = stmt.line;
        self.step()?;
        match &stmt.kind {
            StmtKind::Declare {
                name,
                var_type,
                dims,
                bounds,
            } => self.declare(name, *var_type, dims, bounds.as_ref()),
            StmtKind::Let { name, value } => {
                self.check_bindable(name)?;
                let value = self.eval(value)?;
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
                Ok(())
            }
            StmtKind::For { var, iter, body } => {
                self.check_bindable(var)?;
                let items = self.eval(iter).and_then(|v| self.iterable(v))?;
                for item in items {
                    let bindings = HashMap::from([(var.clone(), item)]);
                    self.scoped(bindings, |this| this.block(body))?;
                }
                Ok(())
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let branch = match self.eval(cond)? {
                    Value::Bool(true) => then_body,
                    Value::Bool(false) => else_body,
                    other => {
                        return Err(self.err(format!("condition must be a bool, found {}", other.type_name())));
                    }
                };
                self.scoped(HashMap::new(), |this| this.block(branch))
            }
            StmtKind::Constrain { name, expr } => self.constrain(name.as_deref(), expr),
            StmtKind::Objective { sense, expr } => self.objective(*sense, expr),
        }
    }

    fn check_bindable(&self, name: &str) -> ExprResult<()> {
        if self.symbols.contains(name) {
            return Err(self.err(format!("cannot assign to specification symbol '{}'", name)));
        }
        if self.containers.contains(name) {
            return Err(self.err(format!("cannot assign to variable container '{}'", name)));
        }
        if RESERVED_SYMBOLS.contains(&name) || BUILTINS.contains(&name) {
            return Err(self.err(format!("'{}' is reserved", name)));
        }
        Ok(())
    }

    fn declare(
        &mut self,
        name: &str,
        var_type: VarType,
        dims: &[Expr],
        bounds: Option<&(Expr, Expr)>,
    ) -> ExprResult<()> {
        let is_primary_name = name == ContainerSet::PRIMARY && self.mode == Mode::Schema;
        if !is_primary_name {
            self.check_bindable(name)?;
        } else if self.containers.contains(name) {
            return Err(self.err(format!("variable container '{}' is already declared", name)));
        }
        if self.scopes.iter().any(|s| s.contains_key(name)) {
            return Err(self.err(format!("'{}' is already bound to a value", name)));
        }

        let (lower, upper) = match bounds {
            Some((lo, hi)) => {
                let lo = self.eval(lo)?;
                let hi = self.eval(hi)?;
                match (lo.as_f64(), hi.as_f64()) {
                    (Some(lo), Some(hi)) => (lo, hi),
                    _ => {
                        return Err(self.err(format!(
                            "bounds must be numbers, found {} and {}",
                            lo.type_name(),
                            hi.type_name()
                        )));
                    }
                }
            }
            None => match var_type {
                VarType::Binary => (0.0, 1.0),
                VarType::Integer | VarType::Continuous => (0.0, f64::INFINITY),
            },
        };

        let mut keys = vec![VarKey::new()];
        for dim in dims {
            let value = self.eval(dim)?;
            let items = match value {
                Value::Int(n) if n >= 0 => (0..n).map(Value::Int).collect(),
                other => self.iterable(other)?,
            };
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                match item.as_key_part() {
                    Some(part) => parts.push(part),
                    None => {
                        return Err(self.err(format!("cannot index a container by {}", item.type_name())));
                    }
                }
            }
            let mut next = Vec::with_capacity(keys.len() * parts.len());
            for key in &keys {
                for part in &parts {
                    self.step()?;
                    let mut key = key.clone();
                    key.push(part.clone());
                    next.push(key);
                }
            }
            keys = next;
        }

        let mut container = VarContainer::new(name, var_type);
        for key in keys {
            let var_name = if key.is_empty() {
                name.to_string()
            } else {
                let parts: Vec<String> = key.parts().iter().map(ToString::to_string).collect();
                format!("{}[{}]", name, parts.join(","))
            };
            let var = self
                .model
                .add_variable(var_name, var_type, lower, upper)
                .map_err(|e| self.err(e.to_string()))?;
            container.insert(key, var);
        }

        self.containers.insert(container);
        self.execution.containers.push(name.to_string());
        Ok(())
    }

    fn constrain(&mut self, template: Option<&str>, expr: &Expr) -> ExprResult<()> {
        if self.mode == Mode::Schema {
            return Err(self.err("constraints are not allowed in a variable schema"));
        }
        let constraint = match self.eval(expr)? {
            Value::Constraint(c) => *c,
            other => {
                return Err(self.err(format!(
                    "constrain expects a comparison of linear expressions, found {}",
                    other.type_name()
                )));
            }
        };
        if self.execution.constraints.len() >= self.limits.max_constraints {
            return Err(ExprError::ConstraintLimit(self.limits.max_constraints));
        }
        let name = template.map(|t| self.render(t)).transpose()?;
        let name = self
            .model
            .add_constraint(name.as_deref(), constraint)
            .map_err(|e| self.err(e.to_string()))?;
        self.execution.constraints.push(name);
        Ok(())
    }

    fn objective(&mut self, sense: ObjectiveSense, expr: &Expr) -> ExprResult<()> {
        if self.mode != Mode::Objective {
            return Err(self.err("objectives are only allowed in objective code"));
        }
        if self.execution.objective.is_some() {
            return Err(self.err("the objective is set more than once"));
        }
        let value = self.eval(expr)?;
        let Some(linear) = value.as_linear() else {
            return Err(self.err(format!("objective must be linear, found {}", value.type_name())));
        };
        self.model.set_objective(linear, sense);
        self.execution.objective = Some(sense);
        Ok(())
    }

    /// Expands `{name}` placeholders of a constraint name template.
    fn render(&self, template: &str) -> ExprResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => return Err(self.err(format!("unclosed placeholder in \"{}\"", template))),
                        }
                    }
                    let value = self.lookup(name.trim())?;
                    match value {
                        Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Bool(_) => {
                            out.push_str(&value.to_string())
                        }
                        other => {
                            return Err(self.err(format!(
                                "cannot use {} in a constraint name",
                                other.type_name()
                            )));
                        }
                    }
                }
                c => out.push(c),
            }
        }
        Ok(out)
    }

    fn lookup(&self, name: &str) -> ExprResult<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(container) = self.containers.get(name) {
            if container.is_scalar() {
                if let Some((_, var)) = container.iter().next() {
                    return Ok(Value::Linear(LinExpr::from(var)));
                }
            }
            return Ok(Value::Container(name.to_string()));
        }
        if let Some(value) = self.symbols.get(name) {
            return Ok(value.clone());
        }
        Err(self.err(format!("unknown symbol '{}'", name)))
    }

    fn iterable(&self, value: Value) -> ExprResult<Vec<Value>> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(self.err(format!("cannot iterate over {}", other.type_name()))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> ExprResult<Value> {
        self.step()?;
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => self.lookup(name),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::List(values))
            }
            Expr::Index { target, indices } => {
                let target = self.eval(target)?;
                let mut values = Vec::with_capacity(indices.len());
                for index in indices {
                    values.push(self.eval(index)?);
                }
                self.index(target, values)
            }
            Expr::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(name, values)
            }
            Expr::Sum(comp) => {
                let mut acc = Value::Int(0);
                self.comprehension(comp, 0, &mut acc)?;
                Ok(acc)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                match (op, value) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(n)) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| self.err("integer overflow")),
                    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnaryOp::Neg, Value::Linear(e)) => Ok(Value::Linear(-e)),
                    (op, other) => Err(self.err(format!(
                        "cannot apply '{}' to {}",
                        if *op == UnaryOp::Not { "not" } else { "-" },
                        other.type_name()
                    ))),
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => match self.eval(lhs)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                Value::Bool(true) => self.expect_bool(rhs, "and"),
                other => Err(self.err(format!("'and' expects bools, found {}", other.type_name()))),
            },
            Expr::Binary(BinaryOp::Or, lhs, rhs) => match self.eval(lhs)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                Value::Bool(false) => self.expect_bool(rhs, "or"),
                other => Err(self.err(format!("'or' expects bools, found {}", other.type_name()))),
            },
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                self.binary(*op, a, b)
            }
        }
    }

    fn expect_bool(&mut self, expr: &Expr, op: &str) -> ExprResult<Value> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(Value::Bool(b)),
            other => Err(self.err(format!("'{}' expects bools, found {}", op, other.type_name()))),
        }
    }

    fn index(&self, target: Value, indices: Vec<Value>) -> ExprResult<Value> {
        match target {
            Value::Container(name) => {
                let Some(container) = self.containers.get(&name) else {
                    return Err(self.err(format!("unknown variable container '{}'", name)));
                };
                let mut key = VarKey::new();
                for index in &indices {
                    match index.as_key_part() {
                        Some(part) => key.push(part),
                        None => {
                            return Err(self.err(format!(
                                "cannot index '{}' by {}",
                                name,
                                index.type_name()
                            )));
                        }
                    }
                }
                container
                    .get(&key)
                    .map(|var| Value::Linear(LinExpr::from(var)))
                    .ok_or_else(|| self.err(format!("key {} is not in '{}'", key, name)))
            }
            Value::List(items) => {
                let [index] = indices.as_slice() else {
                    return Err(self.err("lists take exactly one index"));
                };
                let Value::Int(i) = index else {
                    return Err(self.err(format!("list index must be an int, found {}", index.type_name())));
                };
                let len = items.len() as i64;
                let pos = if *i < 0 { len + i } else { *i };
                if pos < 0 || pos >= len {
                    return Err(self.err(format!("index {} out of range for list of length {}", i, len)));
                }
                Ok(items[pos as usize].clone())
            }
            other => Err(self.err(format!("cannot index {}", other.type_name()))),
        }
    }

    fn comprehension(&mut self, comp: &Comprehension, depth: usize, acc: &mut Value) -> ExprResult<()> {
        if depth == comp.bindings.len() {
            if let Some(filter) = &comp.filter {
                match self.eval(filter)? {
                    Value::Bool(true) => {}
                    Value::Bool(false) => return Ok(()),
                    other => {
                        return Err(self.err(format!("'where' expects a bool, found {}", other.type_name())));
                    }
                }
            }
            let term = self.eval(&comp.body)?;
            let current = mem::replace(acc, Value::Int(0));
            *acc = self.binary(BinaryOp::Add, current, term)?;
            return Ok(());
        }

        let (name, iter) = &comp.bindings[depth];
        self.check_bindable(name)?;
        let items = self.eval(iter).and_then(|v| self.iterable(v))?;
        for item in items {
            let bindings = HashMap::from([(name.clone(), item)]);
            self.scoped(bindings, |this| this.comprehension(comp, depth + 1, acc))?;
        }
        Ok(())
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> ExprResult<Value> {
        match name {
            "range" => {
                let ints: Option<Vec<i64>> = args
                    .iter()
                    .map(|a| match a {
                        Value::Int(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                let (start, stop, step) = match ints.as_deref() {
                    Some([stop]) => (0, *stop, 1),
                    Some([start, stop]) => (*start, *stop, 1),
                    Some([start, stop, step]) => (*start, *stop, *step),
                    _ => return Err(self.err("range expects one to three ints")),
                };
                if step == 0 {
                    return Err(self.err("range step must not be zero"));
                }
                let mut items = Vec::new();
                let mut i = start;
                while (step > 0 && i < stop) || (step < 0 && i > stop) {
                    self.step()?;
                    items.push(Value::Int(i));
                    match i.checked_add(step) {
                        Some(next) => i = next,
                        None => break,
                    }
                }
                Ok(Value::List(items))
            }
            "len" => match args.as_slice() {
                [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
                [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
                [Value::Container(c)] => Ok(Value::Int(
                    self.containers.get(c).map_or(0, VarContainer::len) as i64,
                )),
                _ => Err(self.err("len expects one list, string or container")),
            },
            "sum" => match <[Value; 1]>::try_from(args) {
                Ok([Value::List(items)]) => {
                    let mut acc = Value::Int(0);
                    for item in items {
                        acc = self.binary(BinaryOp::Add, acc, item)?;
                    }
                    Ok(acc)
                }
                _ => Err(self.err("sum expects one list or a comprehension 'sum(i in list: expr)'")),
            },
            "min" | "max" => {
                let items = match <[Value; 1]>::try_from(args) {
                    Ok([Value::List(items)]) => items,
                    Ok([single]) => vec![single],
                    Err(args) => args,
                };
                if items.iter().any(Value::is_linear) {
                    return Err(self.err(format!("{} of variable expressions is not linear", name)));
                }
                let mut best: Option<(f64, Value)> = None;
                for item in items {
                    let Some(x) = item.as_f64() else {
                        return Err(self.err(format!("{} expects numbers, found {}", name, item.type_name())));
                    };
                    let better = match &best {
                        None => true,
                        Some((b, _)) => (name == "min" && x < *b) || (name == "max" && x > *b),
                    };
                    if better {
                        best = Some((x, item));
                    }
                }
                best.map(|(_, v)| v)
                    .ok_or_else(|| self.err(format!("{} of an empty list", name)))
            }
            "abs" => match args.as_slice() {
                [Value::Int(n)] => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| self.err("integer overflow")),
                [Value::Float(f)] => Ok(Value::Float(f.abs())),
                [Value::Linear(_)] => Err(self.err("abs of a variable expression is not linear")),
                _ => Err(self.err("abs expects one number")),
            },
            other => Err(self.err(format!("unknown function '{}'", other))),
        }
    }

    fn binary(&self, op: BinaryOp, a: Value, b: Value) -> ExprResult<Value> {
        let type_error = |this: &Self, a: &Value, b: &Value| {
            this.err(format!(
                "cannot apply '{}' to {} and {}",
                op_symbol(op),
                a.type_name(),
                b.type_name()
            ))
        };

        match op {
            BinaryOp::Add | BinaryOp::Sub => match (&a, &b) {
                (Value::Int(x), Value::Int(y)) => {
                    let r = if op == BinaryOp::Add { x.checked_add(*y) } else { x.checked_sub(*y) };
                    r.map(Value::Int).ok_or_else(|| self.err("integer overflow"))
                }
                (Value::Str(x), Value::Str(y)) if op == BinaryOp::Add => Ok(Value::Str(format!("{}{}", x, y))),
                (Value::List(x), Value::List(y)) if op == BinaryOp::Add => {
                    Ok(Value::List(x.iter().chain(y).cloned().collect()))
                }
                _ if !a.is_linear() && !b.is_linear() => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => Ok(Value::Float(if op == BinaryOp::Add { x + y } else { x - y })),
                    _ => Err(type_error(self, &a, &b)),
                },
                _ => match (a.as_linear(), b.as_linear()) {
                    (Some(x), Some(y)) => Ok(Value::Linear(if op == BinaryOp::Add { x + y } else { x - y })),
                    _ => Err(type_error(self, &a, &b)),
                },
            },
            BinaryOp::Mul => match (&a, &b) {
                (Value::Int(x), Value::Int(y)) => x
                    .checked_mul(*y)
                    .map(Value::Int)
                    .ok_or_else(|| self.err("integer overflow")),
                (Value::Linear(x), Value::Linear(y)) => {
                    if y.is_constant() {
                        Ok(Value::Linear(x.clone().scale(y.constant_value())))
                    } else if x.is_constant() {
                        Ok(Value::Linear(y.clone().scale(x.constant_value())))
                    } else {
                        Err(self.err("nonlinear expression: product of two variable expressions"))
                    }
                }
                (Value::Linear(x), other) | (other, Value::Linear(x)) => match other.as_f64() {
                    Some(k) => Ok(Value::Linear(x.clone().scale(k))),
                    None => Err(type_error(self, &a, &b)),
                },
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => Ok(Value::Float(x * y)),
                    _ => Err(type_error(self, &a, &b)),
                },
            },
            BinaryOp::Div => {
                let divisor = match &b {
                    Value::Linear(e) if e.is_constant() => Some(e.constant_value()),
                    Value::Linear(_) => {
                        return Err(self.err("nonlinear expression: division by a variable expression"));
                    }
                    other => other.as_f64(),
                };
                let Some(d) = divisor else {
                    return Err(type_error(self, &a, &b));
                };
                if d == 0.0 {
                    return Err(self.err("division by zero"));
                }
                match &a {
                    Value::Linear(x) => Ok(Value::Linear(x.clone().scale(1.0 / d))),
                    other => other
                        .as_f64()
                        .map(|x| Value::Float(x / d))
                        .ok_or_else(|| type_error(self, &a, &b)),
                }
            }
            BinaryOp::Mod => match (&a, &b) {
                (Value::Int(_), Value::Int(0)) => Err(self.err("division by zero")),
                (Value::Int(x), Value::Int(y)) => x
                    .checked_rem_euclid(*y)
                    .map(Value::Int)
                    .ok_or_else(|| self.err("integer overflow")),
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(_), Some(y)) if y == 0.0 => Err(self.err("division by zero")),
                    (Some(x), Some(y)) => Ok(Value::Float(x.rem_euclid(y))),
                    _ => Err(type_error(self, &a, &b)),
                },
            },
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
                if a.is_linear() || b.is_linear() =>
            {
                let sense = match op {
                    BinaryOp::Eq => Sense::Eq,
                    BinaryOp::Le => Sense::Le,
                    BinaryOp::Ge => Sense::Ge,
                    BinaryOp::Lt | BinaryOp::Gt => {
                        return Err(self.err(format!(
                            "strict '{}' cannot be used in a constraint; use '{}=' with an explicit margin",
                            op_symbol(op),
                            op_symbol(op)
                        )))
                    }
                    _ => return Err(self.err("'!=' cannot be used in a constraint")),
                };
                match (a.as_linear(), b.as_linear()) {
                    (Some(lhs), Some(rhs)) => Ok(Value::Constraint(Box::new(LinearConstraint::between(
                        lhs, sense, rhs,
                    )))),
                    _ => Err(type_error(self, &a, &b)),
                }
            }
            BinaryOp::Eq => Ok(Value::Bool(a.loosely_equals(&b))),
            BinaryOp::Ne => Ok(Value::Bool(!a.loosely_equals(&b))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&a, &b) {
                    (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
                    _ => match (a.as_f64(), b.as_f64()) {
                        (Some(x), Some(y)) => x.partial_cmp(&y),
                        _ => None,
                    },
                };
                let Some(ordering) = ordering else {
                    return Err(type_error(self, &a, &b));
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            BinaryOp::In => match &b {
                Value::List(items) => Ok(Value::Bool(items.iter().any(|item| item.loosely_equals(&a)))),
                _ => Err(type_error(self, &a, &b)),
            },
            BinaryOp::And | BinaryOp::Or => match (&a, &b) {
                (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(if op == BinaryOp::And { *x && *y } else { *x || *y })),
                _ => Err(type_error(self, &a, &b)),
            },
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::In => "in",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}
