//! Prints a [`Program`] back to source text, recording source map segments.
use crate::ast::*;
use crate::lexer::{Position, is_id_part};
use crate::rules::{Layout, Rule};
use crate::scope::{self, Renames};
use crate::sourcemap::{Segment, advance_cursor};

/// Output of one [`Unparser::unparse`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Printed {
    pub text: String,
    /// Generated positions are relative to the start of `text`.
    pub segments: Vec<Segment>,
    /// The final statement's semicolon was dropped, so text appended after
    /// this program needs a separator.
    pub open_end: bool,
}

#[derive(Debug, Clone)]
pub struct Unparser {
    layout: Layout,
}

impl Unparser {
    pub fn new(rules: &[Rule]) -> Self {
        Self {
            layout: Layout::from_rules(rules),
        }
    }

    pub fn unparse(&self, program: &Program) -> Printed {
        let renames = match &self.layout.reserved {
            Some(reserved) => scope::obfuscate(program, reserved),
            None => Renames::default(),
        };
        let mut emitter = Emitter::new(&self.layout, &renames);
        emitter.program(program);
        Printed {
            text: emitter.out,
            segments: emitter.segments,
            open_end: emitter.open_end,
        }
    }
}

struct Emitter<'a> {
    layout: &'a Layout,
    renames: &'a Renames,
    out: String,
    line: u32,
    column: u32,
    depth: usize,
    line_start: bool,
    last: Option<char>,
    last_integer: bool,
    last_regex: bool,
    open_end: bool,
    segments: Vec<Segment>,
}

fn is_word(c: char) -> bool {
    is_id_part(c) || c == '\\'
}

impl<'a> Emitter<'a> {
    fn new(layout: &'a Layout, renames: &'a Renames) -> Self {
        Self {
            layout,
            renames,
            out: String::new(),
            line: 0,
            column: 0,
            depth: 0,
            line_start: true,
            last: None,
            last_integer: false,
            last_regex: false,
            open_end: false,
            segments: Vec::new(),
        }
    }

    fn raw(&mut self, text: &str) {
        advance_cursor(&mut self.line, &mut self.column, text);
        self.out.push_str(text);
        if let Some(c) = text.chars().last() {
            self.last = Some(c);
        }
    }

    /// Whether `next` would fuse with the previous token without a space.
    fn needs_space(&self, next: char) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        (is_word(last) && is_word(next))
            || (self.last_regex && is_word(next))
            || (last == '+' && next == '+')
            || (last == '-' && next == '-')
            || (last == '/' && (next == '/' || next == '*'))
            || (self.last_integer && next == '.')
            // `<!--` and `-->` open and close HTML-style comments in browsers
            || (last == '<' && next == '!')
            || (next == '>' && self.out.ends_with("--"))
    }

    fn write(&mut self, text: &str, origin: Option<(Position, Option<&str>)>) {
        let Some(first) = text.chars().next() else {
            return;
        };
        if self.line_start {
            self.line_start = false;
            let layout = self.layout;
            if let Some(indent) = &layout.indent {
                for _ in 0..self.depth {
                    self.raw(indent);
                }
            }
        }
        if self.needs_space(first) {
            self.raw(" ");
        }
        if let Some((pos, name)) = origin {
            self.segments.push(Segment {
                generated_line: self.line,
                generated_column: self.column,
                original_line: pos.line.saturating_sub(1),
                original_column: pos.column.saturating_sub(1),
                name: name.map(str::to_string),
            });
        }
        self.raw(text);
        self.last_integer = false;
        self.last_regex = false;
        self.open_end = false;
    }

    fn token(&mut self, text: &str) {
        self.write(text, None);
    }

    fn mapped(&mut self, text: &str, pos: Position) {
        self.write(text, Some((pos, None)));
    }

    fn space(&mut self) {
        if self.layout.pretty() {
            self.raw(" ");
        }
    }

    fn newline(&mut self) {
        if self.layout.pretty() {
            self.raw("\n");
            self.line_start = true;
        }
    }

    fn identifier(&mut self, id: &Identifier) {
        let renames = self.renames;
        match renames.get(id) {
            Some(short) => self.write(short, Some((id.pos, Some(id.name.as_str())))),
            None => self.mapped(&id.name, id.pos),
        }
    }

    fn terminate(&mut self, last: bool) {
        if last && self.layout.drop_semi {
            self.open_end = true;
        } else {
            self.token(";");
        }
    }

    fn program(&mut self, program: &Program) {
        let count = program.body.len();
        for (index, statement) in program.body.iter().enumerate() {
            self.statement(statement, index + 1 == count);
            self.newline();
        }
    }

    fn statement_list(&mut self, statements: &[Statement], last_list: bool) {
        let count = statements.len();
        for (index, statement) in statements.iter().enumerate() {
            self.newline();
            self.statement(statement, last_list && index + 1 == count);
        }
    }

    fn block(&mut self, body: &[Statement]) {
        self.token("{");
        if !body.is_empty() {
            self.depth += 1;
            self.statement_list(body, true);
            self.depth -= 1;
            self.newline();
        }
        self.token("}");
    }

    /// Body of `if`, loops, `with` and labels.
    fn body(&mut self, statement: &Statement, last: bool) {
        match statement {
            Statement::Block(body) => {
                self.space();
                self.block(body);
            }
            Statement::Empty => self.token(";"),
            _ if self.layout.pretty() => {
                self.depth += 1;
                self.newline();
                self.statement(statement, last);
                self.depth -= 1;
            }
            _ => self.statement(statement, last),
        }
    }

    fn parenthesized(&mut self, expression: &Expression) {
        self.token("(");
        self.expression(expression);
        self.token(")");
    }

    fn declarations(&mut self, declarations: &[VarDeclarator]) {
        for (index, declaration) in declarations.iter().enumerate() {
            if index > 0 {
                self.token(",");
                self.space();
            }
            self.identifier(&declaration.id);
            if let Some((pos, init)) = &declaration.init {
                self.space();
                self.mapped("=", *pos);
                self.space();
                self.expression(init);
            }
        }
    }

    fn for_init(&mut self, init: &ForInit) {
        match init {
            ForInit::Var(pos, declarations) => {
                self.mapped("var", *pos);
                self.declarations(declarations);
            }
            ForInit::Expression(expression) => self.expression(expression),
        }
    }

    /// `last` marks the final statement of a block, case body or program.
    fn statement(&mut self, statement: &Statement, last: bool) {
        match statement {
            Statement::Block(body) => self.block(body),
            Statement::Var { pos, declarations } => {
                self.mapped("var", *pos);
                self.declarations(declarations);
                self.terminate(last);
            }
            Statement::Empty => self.token(";"),
            Statement::Expression(expression) => {
                self.expression(expression);
                self.terminate(last);
            }
            Statement::If {
                pos,
                test,
                consequent,
                alternate,
            } => {
                self.mapped("if", *pos);
                self.space();
                self.parenthesized(test);
                let Some(alternate) = alternate else {
                    self.body(consequent, last);
                    return;
                };
                self.body(consequent, false);
                if matches!(**consequent, Statement::Block(_)) {
                    self.space();
                } else {
                    self.newline();
                }
                self.token("else");
                if matches!(**alternate, Statement::If { .. }) {
                    self.space();
                    self.statement(alternate, last);
                } else {
                    self.body(alternate, last);
                }
            }
            Statement::DoWhile { pos, body, test } => {
                self.mapped("do", *pos);
                self.body(body, false);
                if matches!(**body, Statement::Block(_)) {
                    self.space();
                } else {
                    self.newline();
                }
                self.token("while");
                self.space();
                self.parenthesized(test);
                self.terminate(last);
            }
            Statement::While { pos, test, body } => {
                self.mapped("while", *pos);
                self.space();
                self.parenthesized(test);
                self.body(body, last);
            }
            Statement::For {
                pos,
                init,
                test,
                update,
                body,
            } => {
                self.mapped("for", *pos);
                self.space();
                self.token("(");
                if let Some(init) = init {
                    self.for_init(init);
                }
                self.token(";");
                if let Some(test) = test {
                    self.space();
                    self.expression(test);
                }
                self.token(";");
                if let Some(update) = update {
                    self.space();
                    self.expression(update);
                }
                self.token(")");
                self.body(body, last);
            }
            Statement::ForIn {
                pos,
                left,
                right,
                body,
            } => {
                self.mapped("for", *pos);
                self.space();
                self.token("(");
                self.for_init(left);
                self.space();
                self.token("in");
                self.space();
                self.expression(right);
                self.token(")");
                self.body(body, last);
            }
            Statement::Continue { pos, label } | Statement::Break { pos, label } => {
                let keyword = if matches!(statement, Statement::Break { .. }) {
                    "break"
                } else {
                    "continue"
                };
                self.mapped(keyword, *pos);
                if let Some(label) = label {
                    self.space();
                    self.mapped(&label.name, label.pos);
                }
                self.terminate(last);
            }
            Statement::Return { pos, argument } => {
                self.mapped("return", *pos);
                if let Some(argument) = argument {
                    self.space();
                    self.expression(argument);
                }
                self.terminate(last);
            }
            Statement::With { pos, object, body } => {
                self.mapped("with", *pos);
                self.space();
                self.parenthesized(object);
                self.body(body, last);
            }
            Statement::Switch {
                pos,
                discriminant,
                cases,
            } => {
                self.mapped("switch", *pos);
                self.space();
                self.parenthesized(discriminant);
                self.space();
                self.token("{");
                self.depth += 1;
                let count = cases.len();
                for (index, case) in cases.iter().enumerate() {
                    self.newline();
                    match &case.test {
                        Some(test) => {
                            self.token("case");
                            self.space();
                            self.expression(test);
                        }
                        None => self.token("default"),
                    }
                    self.token(":");
                    self.depth += 1;
                    self.statement_list(&case.consequent, index + 1 == count);
                    self.depth -= 1;
                }
                self.depth -= 1;
                if !cases.is_empty() {
                    self.newline();
                }
                self.token("}");
            }
            Statement::Labeled { label, body } => {
                self.mapped(&label.name, label.pos);
                self.token(":");
                self.space();
                self.statement(body, last);
            }
            Statement::Throw { pos, argument } => {
                self.mapped("throw", *pos);
                self.space();
                self.expression(argument);
                self.terminate(last);
            }
            Statement::Try {
                pos,
                block,
                handler,
                finalizer,
            } => {
                self.mapped("try", *pos);
                self.space();
                self.block(block);
                if let Some(handler) = handler {
                    self.space();
                    self.token("catch");
                    self.space();
                    self.token("(");
                    self.identifier(&handler.param);
                    self.token(")");
                    self.space();
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.space();
                    self.token("finally");
                    self.space();
                    self.block(finalizer);
                }
            }
            Statement::Debugger { pos } => {
                self.mapped("debugger", *pos);
                self.terminate(last);
            }
            Statement::Function(function) => self.function(function),
        }
    }

    fn parameters(&mut self, params: &[Identifier]) {
        self.token("(");
        for (index, param) in params.iter().enumerate() {
            if index > 0 {
                self.token(",");
                self.space();
            }
            self.identifier(param);
        }
        self.token(")");
    }

    fn function(&mut self, function: &Function) {
        self.mapped("function", function.pos);
        if let Some(id) = &function.id {
            self.space();
            self.identifier(id);
        }
        self.parameters(&function.params);
        self.space();
        self.block(&function.body);
    }

    fn accessor(&mut self, keyword: &str, key: &PropertyKey, function: &Function) {
        self.mapped(keyword, function.pos);
        self.space();
        self.mapped(&key.raw, key.pos);
        self.parameters(&function.params);
        self.space();
        self.block(&function.body);
    }

    fn list(&mut self, expressions: &[Expression]) {
        for (index, expression) in expressions.iter().enumerate() {
            if index > 0 {
                self.token(",");
                self.space();
            }
            self.expression(expression);
        }
    }

    fn expression(&mut self, expression: &Expression) {
        match expression {
            Expression::This(pos) => self.mapped("this", *pos),
            Expression::Identifier(id) => self.identifier(id),
            Expression::Literal { kind, raw, pos } => {
                self.mapped(raw, *pos);
                match kind {
                    LiteralKind::Number => {
                        self.last_integer = raw.bytes().all(|b| b.is_ascii_digit())
                    }
                    LiteralKind::Regex => self.last_regex = true,
                    _ => {}
                }
            }
            Expression::Array { pos, elements } => {
                self.mapped("[", *pos);
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        self.token(",");
                        self.space();
                    }
                    if let Some(element) = element {
                        self.expression(element);
                    }
                }
                // a trailing hole needs its own comma
                if matches!(elements.last(), Some(None)) {
                    self.token(",");
                }
                self.token("]");
            }
            Expression::Object { pos, properties } => {
                self.mapped("{", *pos);
                if !properties.is_empty() {
                    self.depth += 1;
                    let count = properties.len();
                    for (index, property) in properties.iter().enumerate() {
                        self.newline();
                        match property {
                            Property::Init { key, value } => {
                                self.mapped(&key.raw, key.pos);
                                self.token(":");
                                self.space();
                                self.expression(value);
                            }
                            Property::Get { key, function } => self.accessor("get", key, function),
                            Property::Set { key, function } => self.accessor("set", key, function),
                        }
                        if index + 1 < count {
                            self.token(",");
                        }
                    }
                    self.depth -= 1;
                    self.newline();
                }
                self.token("}");
            }
            Expression::Function(function) => self.function(function),
            Expression::Paren { pos, expression } => {
                self.mapped("(", *pos);
                self.expression(expression);
                self.token(")");
            }
            Expression::Unary {
                operator,
                pos,
                argument,
            } => {
                self.mapped(operator, *pos);
                if operator.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    self.space();
                }
                self.expression(argument);
            }
            Expression::Update {
                operator,
                prefix,
                pos,
                argument,
            } => {
                if *prefix {
                    self.mapped(operator, *pos);
                    self.expression(argument);
                } else {
                    self.expression(argument);
                    self.mapped(operator, *pos);
                }
            }
            Expression::Binary {
                operator,
                pos,
                left,
                right,
            }
            | Expression::Assign {
                operator,
                pos,
                left,
                right,
            } => {
                self.expression(left);
                self.space();
                self.mapped(operator, *pos);
                self.space();
                self.expression(right);
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expression(test);
                self.space();
                self.token("?");
                self.space();
                self.expression(consequent);
                self.space();
                self.token(":");
                self.space();
                self.expression(alternate);
            }
            Expression::Call { callee, arguments } => {
                self.expression(callee);
                self.token("(");
                self.list(arguments);
                self.token(")");
            }
            Expression::New {
                pos,
                callee,
                arguments,
            } => {
                self.mapped("new", *pos);
                self.space();
                self.expression(callee);
                if let Some(arguments) = arguments {
                    self.token("(");
                    self.list(arguments);
                    self.token(")");
                }
            }
            Expression::Member { object, property } => {
                self.expression(object);
                self.token(".");
                self.mapped(&property.name, property.pos);
            }
            Expression::Index { object, property } => {
                self.expression(object);
                self.token("[");
                self.expression(property);
                self.token("]");
            }
            Expression::Sequence(expressions) => self.list(expressions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::reserved_words;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn print(source: &str, rules: &[Rule]) -> Printed {
        let program = parse(source, None).expect("parses");
        Unparser::new(rules).unparse(&program)
    }

    fn minify(source: &str) -> String {
        print(source, &[Rule::minify(false)]).text
    }

    fn pretty(source: &str) -> String {
        print(source, &[Rule::minify(false), Rule::indent("    ")]).text
    }

    const CLOSURE: &str = "(function(root) {
  var bar = 'bar';

  var foo = function() {
    return bar;
  };

  root.name = 'demo';
  root.foo = foo;
  root.bar = bar;
})(window)
";

    #[test]
    fn minifies_declaration() {
        let printed = print("var foo = \"bar\";", &[Rule::minify(false)]);
        assert_eq!(printed.text, "var foo=\"bar\";");
        assert!(!printed.open_end);
        let columns: Vec<_> = printed
            .segments
            .iter()
            .map(|s| (s.generated_column, s.original_column))
            .collect();
        assert_eq!(columns, [(0, 0), (4, 4), (7, 8), (8, 10)]);
    }

    #[test]
    fn inserts_spaces_only_where_tokens_would_fuse() {
        assert_eq!(minify("a + +b; a - -b; a + ++b; a++ + b"), "a+ +b;a- -b;a+ ++b;a++ +b;");
        assert_eq!(minify("x = a / /re/g; y = /re/ in o"), "x=a/ /re/g;y=/re/ in o;");
        assert_eq!(minify("1 .toString(); 1.5.toFixed(); typeof x; return_ = void 0"), "1 .toString();1.5.toFixed();typeof x;return_=void 0;");
        assert_eq!(minify("if (a) { b() } else if (c) d(); else { e() }"), "if(a){b();}else if(c)d();else{e();}");
    }

    #[test]
    fn never_prints_html_comment_markers() {
        assert_eq!(minify("t = a < !--b"), "t=a< !--b;");
        assert_eq!(minify("t = a-- > b"), "t=a-- >b;");
        assert_eq!(minify("t = a < !b"), "t=a< !b;");
    }

    #[test]
    fn keeps_parentheses_and_holes() {
        assert_eq!(minify("(a, b); [, x, , ]; new (f())(); (function () {})()"), "(a,b);[,x,,];new(f())();(function(){})();");
    }

    #[test]
    fn prints_statements_compactly() {
        let source = "for (var i = 0; i < n; i++) { if (!x) continue; }\n\
                      for (k in o) {}\n\
                      do x(); while (y)\n\
                      lbl: while (1) break lbl;\n\
                      switch (v) { case 1: a(); default: b() }\n\
                      try { t() } catch (e) { c(e) } finally { f() }\n\
                      o = { a: 1, 'b': 2, get c() { return 3 }, set c(v) {} };\n\
                      throw new Error('x')";
        assert_eq!(
            minify(source),
            "for(var i=0;i<n;i++){if(!x)continue;}for(k in o){}do x();while(y);lbl:while(1)break lbl;\
             switch(v){case 1:a();default:b();}try{t();}catch(e){c(e);}finally{f();}\
             o={a:1,'b':2,get c(){return 3;},set c(v){}};throw new Error('x');"
        );
    }

    #[test]
    fn drops_semicolons_closing_statement_lists() {
        let rules = [Rule::minify(true)];
        let printed = print("function f() { a(); return b; } if (x) y(); switch (v) { case 1: a(); case 2: b(); } c()", &rules);
        assert_eq!(printed.text, "function f(){a();return b}if(x)y();switch(v){case 1:a();case 2:b()}c()");
        assert!(printed.open_end);
        // empty statements keep their semicolon
        assert_eq!(print("while (x);", &rules).text, "while(x);");
        assert_eq!(print("if (a) b(); else c()", &rules).text, "if(a)b();else c()");
    }

    #[test]
    fn minifying_is_stable() {
        let once = print(CLOSURE, &[Rule::minify(true)]).text;
        assert_eq!(print(&once, &[Rule::minify(true)]).text, once);
    }

    #[test]
    fn obfuscates_closure() {
        let rules = [Rule::minify(true), Rule::obfuscate(reserved_words())];
        let printed = print(CLOSURE, &rules);
        assert_eq!(
            printed.text,
            "(function(a){var b='bar';var c=function(){return b};a.name='demo';a.foo=c;a.bar=b})(window)"
        );
        let names: Vec<_> = printed
            .segments
            .iter()
            .filter_map(|s| s.name.as_deref())
            .collect();
        assert_eq!(
            names,
            ["root", "bar", "foo", "bar", "root", "root", "foo", "root", "bar"]
        );
    }

    #[test]
    fn pretty_prints_with_indentation() {
        assert_eq!(pretty("var foo=\"bar\""), "var foo = \"bar\";\n");
        assert_eq!(
            pretty(CLOSURE),
            "(function(root) {
    var bar = 'bar';
    var foo = function() {
        return bar;
    };
    root.name = 'demo';
    root.foo = foo;
    root.bar = bar;
})(window);
"
        );
    }

    #[test]
    fn pretty_prints_control_flow() {
        assert_eq!(
            pretty("if (a) b(); else if (c) { d() } else e(); switch (x) { case 1: y(); default: } o = {a: 1, b: [1, 2]}"),
            "if (a)
    b();
else if (c) {
    d();
} else
    e();
switch (x) {
    case 1:
        y();
    default:
}
o = {
    a: 1,
    b: [1, 2]
};
"
        );
    }

    #[test]
    fn pretty_segments_track_lines() {
        let printed = print("function f() {\n  return 1;\n}", &[Rule::indent("  ")]);
        assert_eq!(printed.text, "function f() {\n  return 1;\n}\n");
        let ret = printed
            .segments
            .iter()
            .find(|s| s.generated_line == 1)
            .expect("segment on second line");
        assert_eq!((ret.generated_column, ret.original_line, ret.original_column), (2, 1, 2));
    }
}
