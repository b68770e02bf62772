//! Recursive-descent parser.

use rotaforge_milp::{ObjectiveSense, VarType};

use crate::ast::{BinaryOp, Comprehension, Expr, Program, Stmt, StmtKind, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::lexer::{tokenize, Tok, Token};

/// Names callable as `name(args)`.
pub const BUILTINS: &[&str] = &["sum", "range", "len", "min", "max", "abs"];

/// Deepest nesting of parentheses, blocks and prefix operators the parser descends into.
pub const MAX_NESTING: usize = 128;

/// Tallest expression tree a program may contain.
pub const MAX_DEPTH: usize = 256;

/// Parses a complete program.
pub fn parse(source: &str) -> ExprResult<Program> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let mut stmts = Vec::new();
    while !parser.at(&Tok::Eof) {
        stmts.push(parser.statement()?);
    }
    Ok(Program { stmts })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].tok
    }

    fn at(&self, tok: &Tok) -> bool {
        &self.peek().tok == tok
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.at(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        let token = self.peek();
        ExprError::syntax(token.line, token.column, message)
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ExprResult<T>) -> ExprResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(format!(
                "program nests deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    fn bounded(&self, expr: Expr) -> ExprResult<Expr> {
        if expr.depth() > MAX_DEPTH {
            return Err(self.error(format!(
                "expression nests deeper than {} levels; split long chains with sum(...) or 'let'",
                MAX_DEPTH
            )));
        }
        Ok(expr)
    }

    fn link(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> ExprResult<Expr> {
        self.bounded(Expr::binary(op, lhs, rhs))
    }

    fn expect(&mut self, tok: Tok) -> ExprResult<Token> {
        if self.at(&tok) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                tok.describe(),
                self.peek().tok.describe()
            )))
        }
    }

    fn ident(&mut self) -> ExprResult<String> {
        match &self.peek().tok {
            Tok::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier, found {}", other.describe()))),
        }
    }

    fn statement(&mut self) -> ExprResult<Stmt> {
        let line = self.peek().line;
        let kind = match self.peek().tok.clone() {
            Tok::Let => {
                self.advance();
                let name = self.ident()?;
                self.expect(Tok::Assign)?;
                let value = self.expr()?;
                self.expect(Tok::Semi)?;
                StmtKind::Let { name, value }
            }
            Tok::For => {
                self.advance();
                let var = self.ident()?;
                self.expect(Tok::In)?;
                let iter = self.expr()?;
                let body = self.block()?;
                StmtKind::For { var, iter, body }
            }
            Tok::If => self.if_statement()?,
            Tok::Constrain => {
                self.advance();
                let name = match (&self.peek().tok, self.peek_at(1)) {
                    (Tok::Str(s), Tok::Colon) => {
                        let s = s.clone();
                        self.advance();
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                let expr = self.expr()?;
                self.expect(Tok::Semi)?;
                StmtKind::Constrain { name, expr }
            }
            Tok::Minimize | Tok::Maximize => {
                let sense = if self.advance().tok == Tok::Minimize {
                    ObjectiveSense::Minimize
                } else {
                    ObjectiveSense::Maximize
                };
                let expr = self.expr()?;
                self.expect(Tok::Semi)?;
                StmtKind::Objective { sense, expr }
            }
            Tok::Ident(name) if self.peek_at(1) == &Tok::Assign => {
                self.advance();
                self.advance();
                self.declaration(name)?
            }
            other => {
                return Err(self.error(format!("expected a statement, found {}", other.describe())));
            }
        };
        Ok(Stmt { kind, line })
    }

    fn if_statement(&mut self) -> ExprResult<StmtKind> {
        self.expect(Tok::If)?;
        let cond = self.expr()?;
        let then_body = self.block()?;
        let else_body = if self.eat(&Tok::Else) {
            if self.at(&Tok::If) {
                let line = self.peek().line;
                let kind = self.nested(|p| p.if_statement())?;
                vec![Stmt { kind, line }]
            } else {
                self.block()?
            }
        } else {
            Vec::new()
        };
        Ok(StmtKind::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn declaration(&mut self, name: String) -> ExprResult<StmtKind> {
        let var_type = match self.advance().tok {
            Tok::Binary => VarType::Binary,
            Tok::Integer => VarType::Integer,
            Tok::Continuous => VarType::Continuous,
            _ => {
                self.pos -= 1;
                return Err(self.error(
                    "variables are declared as 'name = binary|integer|continuous[...]'; use 'let' for values",
                ));
            }
        };
        self.expect(Tok::LBracket)?;
        let dims = self.expr_list(&Tok::RBracket)?;
        let bounds = if self.eat(&Tok::In) {
            self.expect(Tok::LBracket)?;
            let lo = self.expr()?;
            self.expect(Tok::Comma)?;
            let hi = self.expr()?;
            self.expect(Tok::RBracket)?;
            Some((lo, hi))
        } else {
            None
        };
        self.expect(Tok::Semi)?;
        Ok(StmtKind::Declare {
            name,
            var_type,
            dims,
            bounds,
        })
    }

    fn block(&mut self) -> ExprResult<Vec<Stmt>> {
        self.nested(|p| p.block_body())
    }

    fn block_body(&mut self) -> ExprResult<Vec<Stmt>> {
        self.expect(Tok::LBrace)?;
        let mut stmts = Vec::new();
        while !self.at(&Tok::RBrace) {
            if self.at(&Tok::Eof) {
                return Err(self.error("unclosed block"));
            }
            stmts.push(self.statement()?);
        }
        self.advance();
        Ok(stmts)
    }

    /// Comma-separated expressions up to and including `close`.
    fn expr_list(&mut self, close: &Tok) -> ExprResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expr()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(Tok::Comma)?;
            if self.eat(close) {
                return Ok(items);
            }
        }
    }

    fn expr(&mut self) -> ExprResult<Expr> {
        self.nested(|p| p.or_expr())
    }

    fn or_expr(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Tok::Or) {
            let rhs = self.and_expr()?;
            lhs = self.link(BinaryOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.not_expr()?;
        while self.eat(&Tok::And) {
            let rhs = self.not_expr()?;
            lhs = self.link(BinaryOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> ExprResult<Expr> {
        if self.eat(&Tok::Not) {
            let operand = self.nested(|p| p.not_expr())?;
            return self.bounded(Expr::unary(UnaryOp::Not, operand));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ExprResult<Expr> {
        let lhs = self.additive()?;
        let op = match self.peek().tok {
            Tok::EqEq => BinaryOp::Eq,
            Tok::NotEq => BinaryOp::Ne,
            Tok::Lt => BinaryOp::Lt,
            Tok::Le => BinaryOp::Le,
            Tok::Gt => BinaryOp::Gt,
            Tok::Ge => BinaryOp::Ge,
            Tok::In => BinaryOp::In,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.additive()?;
        if matches!(
            self.peek().tok,
            Tok::EqEq | Tok::NotEq | Tok::Lt | Tok::Le | Tok::Gt | Tok::Ge
        ) {
            return Err(self.error("chained comparisons are not supported; write two constraints"));
        }
        self.link(op, lhs, rhs)
    }

    fn additive(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek().tok {
                Tok::Plus => BinaryOp::Add,
                Tok::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = self.link(op, lhs, rhs)?;
        }
    }

    fn multiplicative(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().tok {
                Tok::Star => BinaryOp::Mul,
                Tok::Slash => BinaryOp::Div,
                Tok::Percent => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = self.link(op, lhs, rhs)?;
        }
    }

    fn unary(&mut self) -> ExprResult<Expr> {
        if self.eat(&Tok::Minus) {
            let operand = self.nested(|p| p.unary())?;
            return self.bounded(Expr::unary(UnaryOp::Neg, operand));
        }
        if self.eat(&Tok::Plus) {
            return self.nested(|p| p.unary());
        }
        self.postfix()
    }

    fn postfix(&mut self) -> ExprResult<Expr> {
        let mut expr = self.primary()?;
        while self.eat(&Tok::LBracket) {
            let indices = self.expr_list(&Tok::RBracket)?;
            if indices.is_empty() {
                return Err(self.error("empty index"));
            }
            expr = self.bounded(Expr::Index {
                target: Box::new(expr),
                indices,
            })?;
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ExprResult<Expr> {
        let token = self.advance();
        match token.tok {
            Tok::Int(n) => Ok(Expr::Int(n)),
            Tok::Float(f) => Ok(Expr::Float(f)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::True => Ok(Expr::Bool(true)),
            Tok::False => Ok(Expr::Bool(false)),
            Tok::LParen => {
                let inner = self.expr()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Tok::LBracket => {
                let items = self.expr_list(&Tok::RBracket)?;
                self.bounded(Expr::List(items))
            }
            Tok::Ident(name) if self.at(&Tok::LParen) => {
                if !BUILTINS.contains(&name.as_str()) {
                    return Err(ExprError::syntax(
                        token.line,
                        token.column,
                        format!("unknown function '{}'", name),
                    ));
                }
                self.advance();
                if name == "sum" && matches!(self.peek().tok, Tok::Ident(_)) && self.peek_at(1) == &Tok::In {
                    return self.nested(|p| p.comprehension());
                }
                let args = self.expr_list(&Tok::RParen)?;
                self.bounded(Expr::Call { name, args })
            }
            Tok::Ident(name) => Ok(Expr::Ident(name)),
            other => Err(ExprError::syntax(
                token.line,
                token.column,
                format!("expected an expression, found {}", other.describe()),
            )),
        }
    }

    /// The part of `sum(a in A, ... where cond: body)` after the opening parenthesis.
    fn comprehension(&mut self) -> ExprResult<Expr> {
        let mut bindings = Vec::new();
        loop {
            let name = self.ident()?;
            self.expect(Tok::In)?;
            let iter = self.additive()?;
            bindings.push((name, iter));
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        let filter = if self.eat(&Tok::Where) {
            Some(self.expr()?)
        } else {
            None
        };
        self.expect(Tok::Colon)?;
        let body = self.expr()?;
        self.expect(Tok::RParen)?;
        self.bounded(Expr::Sum(Box::new(Comprehension {
            bindings,
            filter,
            body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_with_bounds() {
        let program = parse("load = continuous[staff] in [0, num_days * 2];").unwrap();
        let StmtKind::Declare {
            name,
            var_type,
            dims,
            bounds,
        } = &program.stmts[0].kind
        else {
            panic!("expected declaration");
        };
        assert_eq!(name, "load");
        assert_eq!(*var_type, VarType::Continuous);
        assert_eq!(dims, &vec![Expr::ident("staff")]);
        assert!(bounds.is_some());
    }

    #[test]
    fn test_precedence() {
        let program = parse("let v = 1 + 2 * 3 <= 7 and not false;").unwrap();
        let StmtKind::Let { value, .. } = &program.stmts[0].kind else {
            panic!("expected let");
        };
        let expected = Expr::binary(
            BinaryOp::And,
            Expr::binary(
                BinaryOp::Le,
                Expr::binary(
                    BinaryOp::Add,
                    Expr::Int(1),
                    Expr::binary(BinaryOp::Mul, Expr::Int(2), Expr::Int(3)),
                ),
                Expr::Int(7),
            ),
            Expr::unary(UnaryOp::Not, Expr::Bool(false)),
        );
        assert_eq!(value, &expected);
    }

    #[test]
    fn test_named_constraint_and_comprehension() {
        let src = r#"
            for d in days {
                constrain "cover_{d}": sum(e in staff, s in slots where s != 1: x[e, d, s]) >= 1;
            }
        "#;
        let program = parse(src).unwrap();
        let StmtKind::For { body, .. } = &program.stmts[0].kind else {
            panic!("expected for");
        };
        let StmtKind::Constrain { name, expr } = &body[0].kind else {
            panic!("expected constrain");
        };
        assert_eq!(name.as_deref(), Some("cover_{d}"));
        let Expr::Binary(BinaryOp::Ge, lhs, _) = expr else {
            panic!("expected comparison");
        };
        let Expr::Sum(comp) = lhs.as_ref() else {
            panic!("expected sum comprehension");
        };
        assert_eq!(comp.bindings.len(), 2);
        assert!(comp.filter.is_some());
        assert_eq!(body[0].line, 3);
    }

    #[test]
    fn test_else_if_chain() {
        let program = parse("if a { } else if b { } else { minimize 0; }").unwrap();
        let StmtKind::If { else_body, .. } = &program.stmts[0].kind else {
            panic!("expected if");
        };
        assert!(matches!(else_body[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        let err = parse("let a = 1;\nconstrain x[0] <= ;").unwrap_err();
        assert_eq!(
            err,
            ExprError::syntax(2, 19, "expected an expression, found ';'")
        );

        assert!(parse("a = 3;").unwrap_err().to_string().contains("use 'let'"));
        assert!(parse("constrain 1 <= a <= 2;")
            .unwrap_err()
            .to_string()
            .contains("chained"));
        assert!(parse("let a = exec(1);")
            .unwrap_err()
            .to_string()
            .contains("unknown function 'exec'"));
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let src = format!("let a = {}1{};", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&src).unwrap_err();
        assert!(err.to_string().contains("nests deeper than 128"));

        let shallow = format!("let a = {}1{};", "(".repeat(20), ")".repeat(20));
        assert!(parse(&shallow).is_ok());
    }

    #[test]
    fn test_deep_prefix_operators_are_rejected() {
        for prefix in ["-", "+", "not "] {
            let src = format!("let a = {}1;", prefix.repeat(100_000));
            assert!(parse(&src).is_err(), "prefix {:?}", prefix);
        }
        assert!(parse(&format!("let a = {}1;", "-".repeat(10))).is_ok());
    }

    #[test]
    fn test_deep_blocks_and_comprehensions_are_rejected() {
        let blocks = format!("{}{}", "if true { ".repeat(50_000), "}".repeat(50_000));
        assert!(parse(&blocks).is_err());

        let sums = format!("let a = {}1{};", "sum(i in ".repeat(50_000), ")".repeat(50_000));
        assert!(parse(&sums).is_err());
    }

    #[test]
    fn test_long_operator_chains_are_bounded() {
        let long = format!("let a = 1{};", " + 1".repeat(100_000));
        let err = parse(&long).unwrap_err();
        assert!(err.to_string().contains("nests deeper than 256"));

        let indexed = format!("let a = x{};", "[0]".repeat(100_000));
        assert!(parse(&indexed).is_err());

        let fine = format!("let a = 1{};", " + 1".repeat(200));
        let program = parse(&fine).unwrap();
        let StmtKind::Let { value, .. } = &program.stmts[0].kind else {
            panic!("expected let");
        };
        assert_eq!(value.depth(), 201);
    }
}
