//! Scope analysis and short-name assignment for identifier obfuscation.
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::ast::*;

/// New names keyed by the source offset of each renamed identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renames(HashMap<usize, String>);

impl Renames {
    pub fn get(&self, id: &Identifier) -> Option<&str> {
        self.0.get(&id.pos.offset).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compute renames for every binding declared in a function or catch scope.
///
/// Globals are never renamed, and neither is anything declared in a scope that
/// contains `with` or calls `eval` directly (or encloses such a scope).
pub fn obfuscate(program: &Program, reserved: &BTreeSet<String>) -> Renames {
    let mut analysis = Analysis::default();
    analysis.scopes.push(Scope::default());
    analysis.statements(&program.body);
    let scopes = analysis.scopes.len();
    let renames = analysis.renames(reserved);
    debug!("obfuscate: {} scopes, {} identifiers renamed", scopes, renames.0.len());
    renames
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<usize>,
    /// Catch scopes hold only their parameter; `var` goes to the enclosing function.
    catch: bool,
    declared: Vec<String>,
    dynamic: bool,
}

#[derive(Debug)]
struct Reference {
    scope: usize,
    name: String,
    offset: usize,
}

#[derive(Debug, Default)]
struct Analysis {
    /// Scopes in preorder; index 0 is the global scope.
    scopes: Vec<Scope>,
    current: usize,
    references: Vec<Reference>,
}

impl Analysis {
    fn enter(&mut self, catch: bool) -> usize {
        let parent = self.current;
        self.scopes.push(Scope {
            parent: Some(parent),
            catch,
            ..Scope::default()
        });
        self.current = self.scopes.len() - 1;
        parent
    }

    fn declare_in(&mut self, scope: usize, name: &str) {
        let declared = &mut self.scopes[scope].declared;
        if !declared.iter().any(|n| n == name) {
            declared.push(name.to_string());
        }
    }

    /// Nearest enclosing scope that receives `var` and function declarations.
    fn variable_scope(&self) -> usize {
        let mut scope = self.current;
        while self.scopes[scope].catch {
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    fn declare_var(&mut self, id: &Identifier) {
        let scope = self.variable_scope();
        self.declare_in(scope, &id.name);
        self.reference(id);
    }

    fn reference(&mut self, id: &Identifier) {
        self.references.push(Reference {
            scope: self.current,
            name: id.name.clone(),
            offset: id.pos.offset,
        });
    }

    fn mark_dynamic(&mut self) {
        let mut scope = Some(self.current);
        while let Some(index) = scope {
            self.scopes[index].dynamic = true;
            scope = self.scopes[index].parent;
        }
    }

    fn function(&mut self, function: &Function, declaration: bool) {
        if let Some(id) = &function.id {
            if declaration {
                self.declare_var(id);
            }
        }
        let parent = self.enter(false);
        if let Some(id) = &function.id {
            if !declaration {
                self.declare_in(self.current, &id.name);
                self.reference(id);
            }
        }
        for param in &function.params {
            self.declare_in(self.current, &param.name);
            self.reference(param);
        }
        self.statements(&function.body);
        self.current = parent;
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn var_declarations(&mut self, declarations: &[VarDeclarator]) {
        for declaration in declarations {
            self.declare_var(&declaration.id);
            if let Some((_, init)) = &declaration.init {
                self.expression(init);
            }
        }
    }

    fn for_init(&mut self, init: &ForInit) {
        match init {
            ForInit::Var(_, declarations) => self.var_declarations(declarations),
            ForInit::Expression(expression) => self.expression(expression),
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(body) => self.statements(body),
            Statement::Var { declarations, .. } => self.var_declarations(declarations),
            Statement::Empty | Statement::Debugger { .. } => {}
            Statement::Expression(expression) => self.expression(expression),
            Statement::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.expression(test);
                self.statement(consequent);
                if let Some(alternate) = alternate {
                    self.statement(alternate);
                }
            }
            Statement::DoWhile { body, test, .. } | Statement::While { test, body, .. } => {
                self.statement(body);
                self.expression(test);
            }
            Statement::For {
                init,
                test,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.for_init(init);
                }
                for expression in [test, update].into_iter().flatten() {
                    self.expression(expression);
                }
                self.statement(body);
            }
            Statement::ForIn {
                left, right, body, ..
            } => {
                self.for_init(left);
                self.expression(right);
                self.statement(body);
            }
            // labels live in their own namespace
            Statement::Continue { .. } | Statement::Break { .. } => {}
            Statement::Return { argument, .. } => {
                if let Some(argument) = argument {
                    self.expression(argument);
                }
            }
            Statement::With { object, body, .. } => {
                self.expression(object);
                self.mark_dynamic();
                self.statement(body);
            }
            Statement::Switch {
                discriminant,
                cases,
                ..
            } => {
                self.expression(discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.expression(test);
                    }
                    self.statements(&case.consequent);
                }
            }
            Statement::Labeled { body, .. } => self.statement(body),
            Statement::Throw { argument, .. } => self.expression(argument),
            Statement::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.statements(block);
                if let Some(handler) = handler {
                    let parent = self.enter(true);
                    self.declare_in(self.current, &handler.param.name);
                    self.reference(&handler.param);
                    self.statements(&handler.body);
                    self.current = parent;
                }
                if let Some(finalizer) = finalizer {
                    self.statements(finalizer);
                }
            }
            Statement::Function(function) => self.function(function, true),
        }
    }

    fn expression(&mut self, expression: &Expression) {
        match expression {
            Expression::This(_) | Expression::Literal { .. } => {}
            Expression::Identifier(id) => self.reference(id),
            Expression::Array { elements, .. } => {
                for element in elements.iter().flatten() {
                    self.expression(element);
                }
            }
            Expression::Object { properties, .. } => {
                for property in properties {
                    match property {
                        Property::Init { value, .. } => self.expression(value),
                        Property::Get { function, .. } | Property::Set { function, .. } => {
                            self.function(function, false)
                        }
                    }
                }
            }
            Expression::Function(function) => self.function(function, false),
            Expression::Paren { expression, .. } => self.expression(expression),
            Expression::Unary { argument, .. } | Expression::Update { argument, .. } => {
                self.expression(argument)
            }
            Expression::Binary { left, right, .. } | Expression::Assign { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expression(test);
                self.expression(consequent);
                self.expression(alternate);
            }
            Expression::Call { callee, arguments } => {
                if matches!(&**callee, Expression::Identifier(id) if id.name == "eval") {
                    self.mark_dynamic();
                }
                self.expression(callee);
                for argument in arguments {
                    self.expression(argument);
                }
            }
            Expression::New {
                callee, arguments, ..
            } => {
                self.expression(callee);
                for argument in arguments.iter().flatten() {
                    self.expression(argument);
                }
            }
            Expression::Member { object, .. } => self.expression(object),
            Expression::Index { object, property } => {
                self.expression(object);
                self.expression(property);
            }
            Expression::Sequence(expressions) => {
                for expression in expressions {
                    self.expression(expression);
                }
            }
        }
    }

    fn resolve(&self, scope: usize, name: &str) -> Option<usize> {
        let mut current = Some(scope);
        while let Some(index) = current {
            if self.scopes[index].declared.iter().any(|n| n == name) {
                return Some(index);
            }
            current = self.scopes[index].parent;
        }
        None
    }

    fn renames(self, reserved: &BTreeSet<String>) -> Renames {
        // What each scope's subtree references from outside itself.
        let mut outside: Vec<Vec<(Option<usize>, String)>> = vec![Vec::new(); self.scopes.len()];
        let mut resolved = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            let binding = self.resolve(reference.scope, &reference.name);
            let mut current = Some(reference.scope);
            while let Some(index) = current {
                if Some(index) == binding {
                    break;
                }
                outside[index].push((binding, reference.name.clone()));
                current = self.scopes[index].parent;
            }
            resolved.push(binding);
        }

        let mut printed: HashMap<(usize, String), String> = HashMap::new();
        for (index, scope) in self.scopes.iter().enumerate() {
            if index == 0 || scope.dynamic {
                continue;
            }
            let assigned: Vec<(String, String)> = {
                let avoid: BTreeSet<&str> = outside[index]
                    .iter()
                    .map(|(binding, name)| match binding {
                        Some(scope) => printed
                            .get(&(*scope, name.clone()))
                            .map(String::as_str)
                            .unwrap_or(name.as_str()),
                        None => name.as_str(),
                    })
                    .collect();
                let mut candidates = (0..)
                    .map(short_name)
                    .filter(|n| !reserved.contains(n) && !avoid.contains(n.as_str()));
                scope
                    .declared
                    .iter()
                    .filter_map(|name| candidates.next().map(|short| (name.clone(), short)))
                    .collect()
            };
            for (name, short) in assigned {
                printed.insert((index, name), short);
            }
        }

        let mut renames = HashMap::new();
        for (reference, binding) in self.references.iter().zip(resolved) {
            let Some(scope) = binding else { continue };
            if let Some(short) = printed.get(&(scope, reference.name.clone())) {
                if *short != reference.name {
                    renames.insert(reference.offset, short.clone());
                }
            }
        }
        Renames(renames)
    }
}

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NEXT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The `index`-th name of the sequence `a`..`Z`, `aa`..`Z9`, `aaa`...
pub fn short_name(index: usize) -> String {
    let mut rest = index;
    let mut width = 1;
    let mut count = FIRST_CHARS.len();
    while rest >= count {
        rest -= count;
        count *= NEXT_CHARS.len();
        width += 1;
    }
    let mut tail = Vec::with_capacity(width);
    for _ in 1..width {
        tail.push(NEXT_CHARS[rest % NEXT_CHARS.len()]);
        rest /= NEXT_CHARS.len();
    }
    let mut name = String::with_capacity(width);
    name.push(char::from(FIRST_CHARS[rest]));
    name.extend(tail.into_iter().rev().map(char::from));
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::reserved_words;
    use crate::parse;

    fn renamed(source: &str) -> Vec<(String, String)> {
        let program = parse(source, None).expect("parses");
        let renames = obfuscate(&program, &reserved_words());
        let mut pairs: Vec<(usize, String)> = renames.0.into_iter().collect();
        pairs.sort();
        let chars: Vec<char> = source.chars().collect();
        pairs
            .into_iter()
            .map(|(offset, short)| {
                let original: String = chars[offset..]
                    .iter()
                    .take_while(|c| c.is_alphanumeric() || **c == '_' || **c == '$')
                    .collect();
                (original, short)
            })
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn short_names_run_through_letters_then_two_chars() {
        assert_eq!(short_name(0), "a");
        assert_eq!(short_name(25), "z");
        assert_eq!(short_name(26), "A");
        assert_eq!(short_name(51), "Z");
        assert_eq!(short_name(52), "aa");
        assert_eq!(short_name(53), "ab");
        assert_eq!(short_name(52 + 61), "a9");
        assert_eq!(short_name(52 + 62), "ba");
        assert_eq!(short_name(52 + 52 * 62), "aaa");
    }

    #[test]
    fn renames_in_declaration_order() {
        let source = "(function(root) { var bar = 1; var foo = function() { return bar; }; root.foo = foo; })(window)";
        assert_eq!(
            renamed(source),
            pairs(&[
                ("root", "a"),
                ("bar", "b"),
                ("foo", "c"),
                ("bar", "b"),
                ("root", "a"),
                ("foo", "c"),
            ])
        );
    }

    #[test]
    fn globals_are_kept() {
        assert!(renamed("var x = 1; function f(y) { return x + y }").contains(&("y".into(), "a".into())));
        assert!(!renamed("var x = 1; function f(y) { return x + y }").iter().any(|(n, _)| n == "x" || n == "f"));
    }

    #[test]
    fn inner_scope_avoids_names_it_references() {
        let source = "function f(a1, b1) { function g(c1) { return a1 + c1 } }";
        let result = renamed(source);
        // a1 -> a, b1 -> b, g -> c; inside g, `a` is taken by a1
        assert!(result.contains(&("c1".into(), "b".into())));
        assert!(result.contains(&("g".into(), "c".into())));
    }

    #[test]
    fn free_names_are_avoided() {
        let result = renamed("function f(x) { return a + x }");
        assert_eq!(result, pairs(&[("x", "b"), ("x", "b")]));
    }

    #[test]
    fn with_and_eval_disable_renaming_up_the_chain() {
        assert!(renamed("function f(x) { with (o) { x } }").is_empty());
        assert!(renamed("function f(x) { function g(y) { eval(y) } }").is_empty());
        // a sibling function is unaffected
        let result = renamed("function f(x) { eval(x) } function g(y) { return y }");
        assert_eq!(result, pairs(&[("y", "a"), ("y", "a")]));
    }

    #[test]
    fn catch_parameter_gets_its_own_scope() {
        let result = renamed("function f() { try {} catch (err) { var v = err } }");
        assert_eq!(result, pairs(&[("err", "b"), ("v", "a"), ("err", "b")]));
    }

    #[test]
    fn skips_reserved_words() {
        let mut reserved = BTreeSet::new();
        reserved.insert("a".to_string());
        let program = parse("function f(x) { return x }", None).expect("parses");
        let renames = obfuscate(&program, &reserved);
        assert!(renames.0.values().all(|name| name == "b"));
    }
}
