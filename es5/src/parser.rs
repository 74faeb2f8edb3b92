//! Recursive-descent parser for ES5 programs.
use crate::ast::*;
use crate::error::{Result, SyntaxError};
use crate::lexer::{Lexer, Position, Token, TokenKind};

/// Parse `source` into a [`Program`].
///
/// `source_name` is attached to any [`SyntaxError`] so that the message reads
/// `... at <line>:<column> in '<source_name>'`.
pub fn parse(source: &str, source_name: Option<&str>) -> Result<Program> {
    let result = Parser::new(source).and_then(|mut parser| parser.program());
    result.map_err(|err| match source_name {
        Some(name) => err.with_source(name),
        None => err,
    })
}

/// Deepest nesting of statements and expressions accepted.
pub const MAX_DEPTH: usize = 256;

/// Longest run of binary operators, calls or member accesses folded into one
/// left-leaning expression.
pub const MAX_CHAIN: usize = 1024;

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", ">>>=", "&=", "|=", "^=",
];

fn binary_precedence(operator: &str) -> Option<u8> {
    let prec = match operator {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "===" | "!==" => 6,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    };
    Some(prec)
}

struct Parser {
    lexer: Lexer,
    token: Token,
    depth: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let token = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.token, next))
    }

    fn unexpected(&self) -> SyntaxError {
        if self.token.is_eof() {
            SyntaxError::new("Unexpected end of input", self.token.pos)
        } else {
            SyntaxError::new(format!("Unexpected '{}'", self.token.text), self.token.pos)
        }
    }

    fn expect(&mut self, text: &str) -> Result<Token> {
        if self.token.is(text) {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    /// Run `parse` one nesting level deeper.
    ///
    /// Printing and scope analysis recurse over the tree as well, so the limit
    /// bounds every later walk too.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count one more link of a left-leaning chain.
    fn link(&self, links: &mut usize) -> Result<()> {
        *links += 1;
        if *links > MAX_CHAIN {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn too_deep(&self) -> SyntaxError {
        SyntaxError::new("Maximum nesting depth exceeded", self.token.pos)
    }

    fn eat(&mut self, text: &str) -> Result<bool> {
        if self.token.is(text) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn identifier(&mut self) -> Result<Identifier> {
        if !self.token.is_identifier() {
            return Err(self.unexpected());
        }
        let token = self.advance()?;
        Ok(Identifier {
            name: token.text,
            pos: token.pos,
        })
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.eat(";")? {
            return Ok(());
        }
        if self.token.is("}") || self.token.is_eof() || self.token.newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    /// Whether a restricted production (`return`, `break`, ...) ends here.
    fn at_statement_end(&self) -> bool {
        self.token.is(";") || self.token.is("}") || self.token.is_eof() || self.token.newline_before
    }

    fn program(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.token.is_eof() {
            body.push(self.statement()?);
        }
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Statement> {
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> Result<Statement> {
        if self.token.kind == TokenKind::Punct {
            if self.token.is("{") {
                return Ok(Statement::Block(self.block()?));
            }
            if self.token.is(";") {
                self.advance()?;
                return Ok(Statement::Empty);
            }
        }
        if self.token.kind == TokenKind::Name {
            match self.token.text.as_str() {
                "var" => {
                    let pos = self.advance()?.pos;
                    let declarations = self.var_declarations(false)?;
                    self.consume_semicolon()?;
                    return Ok(Statement::Var { pos, declarations });
                }
                "if" => return self.if_statement(),
                "do" => return self.do_while_statement(),
                "while" => {
                    let pos = self.advance()?.pos;
                    let test = self.paren_expression()?;
                    let body = Box::new(self.statement()?);
                    return Ok(Statement::While { pos, test, body });
                }
                "for" => return self.for_statement(),
                "continue" | "break" => return self.jump_statement(),
                "return" => {
                    let pos = self.advance()?.pos;
                    let argument = if self.at_statement_end() {
                        None
                    } else {
                        Some(self.expression(false)?)
                    };
                    self.consume_semicolon()?;
                    return Ok(Statement::Return { pos, argument });
                }
                "with" => {
                    let pos = self.advance()?.pos;
                    let object = self.paren_expression()?;
                    let body = Box::new(self.statement()?);
                    return Ok(Statement::With { pos, object, body });
                }
                "switch" => return self.switch_statement(),
                "throw" => {
                    let pos = self.advance()?.pos;
                    if self.token.newline_before {
                        return Err(SyntaxError::new("Illegal newline after throw", self.token.pos));
                    }
                    let argument = self.expression(false)?;
                    self.consume_semicolon()?;
                    return Ok(Statement::Throw { pos, argument });
                }
                "try" => return self.try_statement(),
                "debugger" => {
                    let pos = self.advance()?.pos;
                    self.consume_semicolon()?;
                    return Ok(Statement::Debugger { pos });
                }
                "function" => return self.function_declaration(),
                _ => {}
            }
        }

        let expression = self.expression(false)?;
        if let Expression::Identifier(label) = &expression {
            if self.token.is(":") {
                let label = label.clone();
                self.advance()?;
                let body = Box::new(self.statement()?);
                return Ok(Statement::Labeled { label, body });
            }
        }
        self.consume_semicolon()?;
        Ok(Statement::Expression(expression))
    }

    fn block(&mut self) -> Result<Vec<Statement>> {
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.token.is("}") {
            if self.token.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        self.advance()?;
        Ok(body)
    }

    fn paren_expression(&mut self) -> Result<Expression> {
        self.expect("(")?;
        let expression = self.expression(false)?;
        self.expect(")")?;
        Ok(expression)
    }

    fn var_declarations(&mut self, no_in: bool) -> Result<Vec<VarDeclarator>> {
        let mut declarations = Vec::new();
        loop {
            let id = self.identifier()?;
            let init = if self.token.is("=") {
                let pos = self.advance()?.pos;
                Some((pos, self.assignment(no_in)?))
            } else {
                None
            };
            declarations.push(VarDeclarator { id, init });
            if !self.eat(",")? {
                return Ok(declarations);
            }
        }
    }

    fn if_statement(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        let test = self.paren_expression()?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.eat("else")? {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            pos,
            test,
            consequent,
            alternate,
        })
    }

    fn do_while_statement(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        let body = Box::new(self.statement()?);
        self.expect("while")?;
        let test = self.paren_expression()?;
        // the semicolon after `do ... while (...)` is always optional
        self.eat(";")?;
        Ok(Statement::DoWhile { pos, body, test })
    }

    fn for_statement(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        self.expect("(")?;

        let init = if self.token.is(";") {
            None
        } else if self.token.is("var") {
            let var_pos = self.advance()?.pos;
            let declarations = self.var_declarations(true)?;
            if declarations.len() == 1 && self.token.is("in") {
                return self.for_in_rest(pos, ForInit::Var(var_pos, declarations));
            }
            Some(ForInit::Var(var_pos, declarations))
        } else {
            let expression = self.expression(true)?;
            if self.token.is("in") {
                if !expression.is_reference() {
                    return Err(SyntaxError::new(
                        "Invalid left-hand side in for-in",
                        self.token.pos,
                    ));
                }
                return self.for_in_rest(pos, ForInit::Expression(expression));
            }
            Some(ForInit::Expression(expression))
        };

        self.expect(";")?;
        let test = if self.token.is(";") {
            None
        } else {
            Some(self.expression(false)?)
        };
        self.expect(";")?;
        let update = if self.token.is(")") {
            None
        } else {
            Some(self.expression(false)?)
        };
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(Statement::For {
            pos,
            init,
            test,
            update,
            body,
        })
    }

    fn for_in_rest(&mut self, pos: Position, left: ForInit) -> Result<Statement> {
        self.expect("in")?;
        let right = self.expression(false)?;
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(Statement::ForIn {
            pos,
            left,
            right,
            body,
        })
    }

    fn jump_statement(&mut self) -> Result<Statement> {
        let keyword = self.advance()?;
        let label = if !self.token.newline_before && self.token.is_identifier() {
            Some(self.identifier()?)
        } else {
            None
        };
        self.consume_semicolon()?;
        let pos = keyword.pos;
        Ok(if keyword.text == "break" {
            Statement::Break { pos, label }
        } else {
            Statement::Continue { pos, label }
        })
    }

    fn switch_statement(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        let discriminant = self.paren_expression()?;
        self.expect("{")?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.eat("}")? {
            let test = if self.eat("case")? {
                Some(self.expression(false)?)
            } else if self.token.is("default") && !seen_default {
                seen_default = true;
                self.advance()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(":")?;
            let mut consequent = Vec::new();
            while !(self.token.is("case") || self.token.is("default") || self.token.is("}")) {
                if self.token.is_eof() {
                    return Err(self.unexpected());
                }
                consequent.push(self.statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        Ok(Statement::Switch {
            pos,
            discriminant,
            cases,
        })
    }

    fn try_statement(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        let block = self.block()?;
        let handler = if self.eat("catch")? {
            self.expect("(")?;
            let param = self.identifier()?;
            self.expect(")")?;
            let body = self.block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat("finally")? {
            Some(self.block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected());
        }
        Ok(Statement::Try {
            pos,
            block,
            handler,
            finalizer,
        })
    }

    fn function_declaration(&mut self) -> Result<Statement> {
        let pos = self.advance()?.pos;
        if self.token.is("(") {
            return Err(SyntaxError::new(
                "Function statement requires a name",
                self.token.pos,
            ));
        }
        let id = self.identifier()?;
        Ok(Statement::Function(self.function_rest(pos, Some(id))?))
    }

    fn function_rest(&mut self, pos: Position, id: Option<Identifier>) -> Result<Function> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.token.is(")") {
            loop {
                params.push(self.identifier()?);
                if !self.eat(",")? {
                    break;
                }
            }
        }
        self.expect(")")?;
        let body = self.block()?;
        Ok(Function {
            pos,
            id,
            params,
            body,
        })
    }

    fn expression(&mut self, no_in: bool) -> Result<Expression> {
        let first = self.assignment(no_in)?;
        if !self.token.is(",") {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(",")? {
            expressions.push(self.assignment(no_in)?);
        }
        Ok(Expression::Sequence(expressions))
    }

    fn assignment(&mut self, no_in: bool) -> Result<Expression> {
        self.nested(|parser| parser.assignment_body(no_in))
    }

    fn assignment_body(&mut self, no_in: bool) -> Result<Expression> {
        let left = self.conditional(no_in)?;
        let is_assignment = self.token.kind == TokenKind::Punct
            && ASSIGNMENT_OPERATORS.contains(&self.token.text.as_str());
        if !is_assignment {
            return Ok(left);
        }
        if !left.is_reference() {
            return Err(SyntaxError::new(
                "Invalid left-hand side in assignment",
                self.token.pos,
            ));
        }
        let operator = self.advance()?;
        let right = self.assignment(no_in)?;
        Ok(Expression::Assign {
            operator: operator.text,
            pos: operator.pos,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn conditional(&mut self, no_in: bool) -> Result<Expression> {
        let test = self.binary(1, no_in)?;
        if !self.eat("?")? {
            return Ok(test);
        }
        let consequent = self.assignment(false)?;
        self.expect(":")?;
        let alternate = self.assignment(no_in)?;
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn current_binary_precedence(&self, no_in: bool) -> Option<u8> {
        if !matches!(self.token.kind, TokenKind::Punct | TokenKind::Name) {
            return None;
        }
        if no_in && self.token.text == "in" {
            return None;
        }
        binary_precedence(&self.token.text)
    }

    fn binary(&mut self, min_prec: u8, no_in: bool) -> Result<Expression> {
        let mut left = self.unary()?;
        let mut links = 0;
        while let Some(prec) = self.current_binary_precedence(no_in) {
            if prec < min_prec {
                break;
            }
            self.link(&mut links)?;
            let operator = self.advance()?;
            let right = self.binary(prec + 1, no_in)?;
            left = Expression::Binary {
                operator: operator.text,
                pos: operator.pos,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression> {
        let is_unary = match self.token.kind {
            TokenKind::Punct => matches!(self.token.text.as_str(), "+" | "-" | "~" | "!"),
            TokenKind::Name => matches!(self.token.text.as_str(), "delete" | "void" | "typeof"),
            _ => false,
        };
        if is_unary {
            let operator = self.advance()?;
            let argument = self.nested(Self::unary)?;
            return Ok(Expression::Unary {
                operator: operator.text,
                pos: operator.pos,
                argument: Box::new(argument),
            });
        }
        if self.token.is("++") || self.token.is("--") {
            let operator = self.advance()?;
            let argument = self.nested(Self::unary)?;
            if !argument.is_reference() {
                return Err(SyntaxError::new(
                    "Invalid left-hand side in prefix operation",
                    operator.pos,
                ));
            }
            return Ok(Expression::Update {
                operator: operator.text,
                prefix: true,
                pos: operator.pos,
                argument: Box::new(argument),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expression> {
        let argument = self.left_hand_side()?;
        if (self.token.is("++") || self.token.is("--")) && !self.token.newline_before {
            if !argument.is_reference() {
                return Err(SyntaxError::new(
                    "Invalid left-hand side in postfix operation",
                    self.token.pos,
                ));
            }
            let operator = self.advance()?;
            return Ok(Expression::Update {
                operator: operator.text,
                prefix: false,
                pos: operator.pos,
                argument: Box::new(argument),
            });
        }
        Ok(argument)
    }

    fn left_hand_side(&mut self) -> Result<Expression> {
        let mut expression = if self.token.is("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };
        let mut links = 0;
        loop {
            if self.token.is("(") || self.at_member_suffix() {
                self.link(&mut links)?;
            }
            if self.token.is("(") {
                let arguments = self.arguments()?;
                expression = Expression::Call {
                    callee: Box::new(expression),
                    arguments,
                };
            } else if self.at_member_suffix() {
                expression = self.member(expression)?;
            } else {
                return Ok(expression);
            }
        }
    }

    fn at_member_suffix(&self) -> bool {
        self.token.is(".") || self.token.is("[")
    }

    /// Apply a `.name` or `[expr]` suffix to `object`.
    fn member(&mut self, object: Expression) -> Result<Expression> {
        if self.eat(".")? {
            if self.token.kind != TokenKind::Name {
                return Err(self.unexpected());
            }
            let name = self.advance()?;
            return Ok(Expression::Member {
                object: Box::new(object),
                property: Identifier {
                    name: name.text,
                    pos: name.pos,
                },
            });
        }
        self.expect("[")?;
        let property = self.expression(false)?;
        self.expect("]")?;
        Ok(Expression::Index {
            object: Box::new(object),
            property: Box::new(property),
        })
    }

    fn new_expression(&mut self) -> Result<Expression> {
        let pos = self.advance()?.pos;
        let mut callee = if self.token.is("new") {
            self.nested(Self::new_expression)?
        } else {
            self.primary()?
        };
        let mut links = 0;
        while self.at_member_suffix() {
            self.link(&mut links)?;
            callee = self.member(callee)?;
        }
        let arguments = if self.token.is("(") {
            Some(self.arguments()?)
        } else {
            None
        };
        Ok(Expression::New {
            pos,
            callee: Box::new(callee),
            arguments,
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect("(")?;
        let mut arguments = Vec::new();
        if self.eat(")")? {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.assignment(false)?);
            if !self.eat(",")? {
                break;
            }
        }
        self.expect(")")?;
        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expression> {
        match self.token.kind {
            TokenKind::Number | TokenKind::String => {
                let kind = if self.token.kind == TokenKind::Number {
                    LiteralKind::Number
                } else {
                    LiteralKind::String
                };
                let token = self.advance()?;
                Ok(Expression::Literal {
                    kind,
                    raw: token.text,
                    pos: token.pos,
                })
            }
            TokenKind::Name => match self.token.text.as_str() {
                "this" => Ok(Expression::This(self.advance()?.pos)),
                "null" | "true" | "false" => {
                    let kind = if self.token.text == "null" {
                        LiteralKind::Null
                    } else {
                        LiteralKind::Boolean
                    };
                    let token = self.advance()?;
                    Ok(Expression::Literal {
                        kind,
                        raw: token.text,
                        pos: token.pos,
                    })
                }
                "function" => {
                    let pos = self.advance()?.pos;
                    let id = if self.token.is("(") {
                        None
                    } else {
                        Some(self.identifier()?)
                    };
                    Ok(Expression::Function(Box::new(self.function_rest(pos, id)?)))
                }
                _ => Ok(Expression::Identifier(self.identifier()?)),
            },
            TokenKind::Punct => match self.token.text.as_str() {
                "/" | "/=" => {
                    let regex = self.lexer.rescan_regex(&self.token)?;
                    self.token = regex;
                    let token = self.advance()?;
                    Ok(Expression::Literal {
                        kind: LiteralKind::Regex,
                        raw: token.text,
                        pos: token.pos,
                    })
                }
                "[" => self.array(),
                "{" => self.object(),
                "(" => {
                    let pos = self.advance()?.pos;
                    let expression = self.expression(false)?;
                    self.expect(")")?;
                    Ok(Expression::Paren {
                        pos,
                        expression: Box::new(expression),
                    })
                }
                _ => Err(self.unexpected()),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn array(&mut self) -> Result<Expression> {
        let pos = self.advance()?.pos;
        let mut elements = Vec::new();
        while !self.eat("]")? {
            if self.eat(",")? {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.assignment(false)?));
            if !self.token.is("]") {
                self.expect(",")?;
            }
        }
        Ok(Expression::Array { pos, elements })
    }

    fn object(&mut self) -> Result<Expression> {
        let pos = self.advance()?.pos;
        let mut properties = Vec::new();
        while !self.eat("}")? {
            properties.push(self.property()?);
            if !self.token.is("}") {
                self.expect(",")?;
            }
        }
        Ok(Expression::Object { pos, properties })
    }

    fn property_key(&mut self) -> Result<PropertyKey> {
        match self.token.kind {
            TokenKind::Name | TokenKind::String | TokenKind::Number => {
                let token = self.advance()?;
                Ok(PropertyKey {
                    raw: token.text,
                    pos: token.pos,
                })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn property(&mut self) -> Result<Property> {
        let key = self.property_key()?;
        let accessor = key.raw == "get" || key.raw == "set";
        if accessor && !self.token.is(":") {
            let function_pos = key.pos;
            let name = self.property_key()?;
            self.expect("(")?;
            let params = if key.raw == "set" {
                vec![self.identifier()?]
            } else {
                Vec::new()
            };
            self.expect(")")?;
            let body = self.block()?;
            let function = Function {
                pos: function_pos,
                id: None,
                params,
                body,
            };
            return Ok(if key.raw == "get" {
                Property::Get {
                    key: name,
                    function,
                }
            } else {
                Property::Set {
                    key: name,
                    function,
                }
            });
        }
        self.expect(":")?;
        let value = self.assignment(false)?;
        Ok(Property::Init { key, value })
    }
}
