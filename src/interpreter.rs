use std::io::Write;

use crate::block::{BlockControl, BlockData};
use crate::error::RuntimeError;
use crate::node::{Node, Operator};
use crate::parser::Program;
use crate::symtable::SymbolTable;
use crate::value::Value;

type EvalResult = Result<Value, RuntimeError>;

/// Walks a parsed program and evaluates it. `print` output goes through the
/// interpreter's sink, so callers (and tests) decide where it lands.
pub struct Interpreter<W: Write> {
    out: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Interpreter { out }
    }

    /// Evaluates every top-level statement in source order and returns the
    /// last statement's value, or null for an empty program. Any failure
    /// halts the run; the program (and with it every node and scope) is
    /// released either way.
    pub fn interpret(&mut self, program: Program) -> EvalResult {
        let Program {
            statements,
            mut symbols,
        } = program;

        let mut results = vec![];
        for statement in &statements {
            results.push(self.evaluate(statement, &mut symbols)?);
        }

        Ok(results.pop().unwrap_or(Value::Null))
    }

    fn evaluate(&mut self, node: &Node, symbols: &mut SymbolTable) -> EvalResult {
        match node {
            Node::Literal(value) => Ok(*value),

            // Parse-time placeholders evaluate to nothing.
            Node::TypeTag(_) | Node::Param(_) => Ok(Value::Null),

            Node::Symbol(name) => Err(RuntimeError::new(format!("unknown symbol '{name}'"))),

            Node::Var(data) => {
                if data.declaration {
                    return Ok(Value::Null);
                }
                let slot = symbols.slot(data.scope, data.slot);
                if !slot.initialized {
                    return Err(RuntimeError::new("cannot evaluate an unitialized variable"));
                }
                Ok(slot.value)
            }

            Node::Assign(data) => {
                let value = self.evaluate(&data.value, symbols)?;
                let slot = symbols.slot_mut(data.target.scope, data.target.slot);
                if value.value_type() != slot.r#type {
                    return Err(RuntimeError::new(
                        "cannot assign a variable to a value of a different type",
                    ));
                }
                slot.value = value;
                slot.initialized = true;
                Ok(value)
            }

            Node::Comparison(data) => {
                let left = self.evaluate(&data.left, symbols)?;
                let right = self.evaluate(&data.right, symbols)?;
                comparison(data.operator, left, right)
            }

            Node::Logical(data) => {
                let left = self.evaluate(&data.left, symbols)?;
                let right = self.evaluate(&data.right, symbols)?;
                logical(data.operator, left, right)
            }

            Node::Arithmetic(data) => {
                let left = self.evaluate(&data.left, symbols)?;
                let right = self.evaluate(&data.right, symbols)?;
                arithmetic(data.operator, left, right)
            }

            Node::Print(data) => {
                for arg in &data.args {
                    let value = self.evaluate(arg, symbols)?;
                    write!(self.out, "{value}").map_err(write_error)?;
                }
                if data.newline {
                    writeln!(self.out).map_err(write_error)?;
                } else {
                    self.out.flush().map_err(write_error)?;
                }
                Ok(Value::Null)
            }

            Node::Block(data) => self.eval_block(data, symbols),

            Node::EvalBlock(inner) => self.evaluate(inner, symbols),
        }
    }

    fn eval_block(&mut self, block: &BlockData, symbols: &mut SymbolTable) -> EvalResult {
        match &block.control {
            BlockControl::Plain => self.eval_statements(&block.statements, symbols),

            BlockControl::Cond {
                condition,
                else_branch,
                ..
            } => match self.evaluate(condition, symbols)? {
                Value::Bool(true) => self.eval_statements(&block.statements, symbols),
                Value::Bool(false) => match else_branch {
                    Some(else_branch) => self.eval_statements(&else_branch.statements, symbols),
                    None => Ok(Value::Null),
                },
                _ => Err(RuntimeError::new("invalid conditional")),
            },

            BlockControl::Loop { condition } => {
                let mut result = Value::Null;
                loop {
                    match self.evaluate(condition, symbols)? {
                        Value::Bool(true) => {
                            result = self.eval_statements(&block.statements, symbols)?;
                        }
                        Value::Bool(false) => break,
                        _ => return Err(RuntimeError::new("invalid conditional")),
                    }
                }
                Ok(result)
            }
        }
    }

    /// Evaluates a statement list and yields the last value, or null for an
    /// empty list.
    fn eval_statements(&mut self, statements: &[Node], symbols: &mut SymbolTable) -> EvalResult {
        let mut result = Value::Null;
        for statement in statements {
            result = self.evaluate(statement, symbols)?;
        }
        Ok(result)
    }
}

fn write_error(_: std::io::Error) -> RuntimeError {
    RuntimeError::new("failed to write output")
}

/// Applies a comparison operator. Operands must share a type; ordering
/// additionally requires numeric operands.
fn comparison(operator: Operator, left: Value, right: Value) -> EvalResult {
    if left.value_type() != right.value_type() {
        return Err(RuntimeError::new(
            "cannot compare two values of differing types",
        ));
    }

    let result = match operator {
        Operator::Equal => left == right,
        Operator::NotEqual => left != right,
        Operator::LessThan | Operator::GreaterThan => {
            let ordering = match (left, right) {
                (Value::Int(left), Value::Int(right)) => (left < right, left > right),
                (Value::Float(left), Value::Float(right)) => (left < right, left > right),
                _ => {
                    return Err(RuntimeError::new(format!(
                        "cannot use the '{operator}' operator on non-numeric values"
                    )))
                }
            };
            if operator == Operator::LessThan {
                ordering.0
            } else {
                ordering.1
            }
        }
        _ => unreachable!(),
    };

    Ok(Value::Bool(result))
}

/// Applies a logical operator. Both operands must be booleans; both sides
/// are already evaluated, so there is no short-circuit.
fn logical(operator: Operator, left: Value, right: Value) -> EvalResult {
    let (Value::Bool(left), Value::Bool(right)) = (left, right) else {
        return Err(RuntimeError::new(
            "invalid operand types for logical operation",
        ));
    };

    let result = match operator {
        Operator::LogicAnd => left && right,
        Operator::LogicOr => left || right,
        _ => unreachable!(),
    };

    Ok(Value::Bool(result))
}

/// Applies an arithmetic operator. Operands must be numeric and share a
/// type; the result keeps that type, except `%`, which truncates to int.
fn arithmetic(operator: Operator, left: Value, right: Value) -> EvalResult {
    if left.value_type() != right.value_type() {
        return Err(RuntimeError::new(
            "cannot perform arithmetic on differing types",
        ));
    }

    match (left, right) {
        (Value::Int(left), Value::Int(right)) => int_arithmetic(operator, left, right),
        (Value::Float(left), Value::Float(right)) => float_arithmetic(operator, left, right),
        _ => Err(RuntimeError::new("invalid operation for non-numeric types")),
    }
}

fn int_arithmetic(operator: Operator, left: i32, right: i32) -> EvalResult {
    let result = match operator {
        Operator::Add => left.wrapping_add(right),
        Operator::Sub => left.wrapping_sub(right),
        Operator::Mul => left.wrapping_mul(right),
        Operator::Div => {
            if right == 0 {
                return Err(RuntimeError::new("division by zero"));
            }
            left.wrapping_div(right)
        }
        Operator::Mod => {
            if right == 0 {
                return Err(RuntimeError::new("division by zero"));
            }
            left.wrapping_rem(right)
        }
        Operator::Pow => {
            // Repeated multiplication; a negative exponent multiplies zero
            // times and leaves one.
            let mut result = 1i32;
            for _ in 0..right.max(0) {
                result = result.wrapping_mul(left);
            }
            result
        }
        _ => unreachable!(),
    };

    Ok(Value::Int(result))
}

fn float_arithmetic(operator: Operator, left: f64, right: f64) -> EvalResult {
    let result = match operator {
        Operator::Add => left + right,
        Operator::Sub => left - right,
        Operator::Mul => left * right,
        Operator::Div => left / right,
        Operator::Mod => {
            // `%` truncates its operands to int and yields int.
            let (left, right) = (left as i32, right as i32);
            if right == 0 {
                return Err(RuntimeError::new("division by zero"));
            }
            return Ok(Value::Int(left.wrapping_rem(right)));
        }
        Operator::Pow => {
            let mut result = 1.0;
            let mut count = 0;
            while (count as f64) < right {
                result *= left;
                count += 1;
            }
            result
        }
        _ => unreachable!(),
    };

    Ok(Value::Float(result))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn run(source: &str) -> EvalResult {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        Interpreter::new(Vec::new()).interpret(program)
    }

    fn run_for_output(source: &str) -> String {
        let mut output = Vec::new();
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        Interpreter::new(&mut output).interpret(program).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn evaluates_literals() {
        assert_eq!(run("5;"), Ok(Value::Int(5)));
        assert_eq!(run("1.25;"), Ok(Value::Float(1.25)));
        assert_eq!(run("'a';"), Ok(Value::Char('a')));
        assert_eq!(run("true;"), Ok(Value::Bool(true)));
        assert_eq!(run("false;"), Ok(Value::Bool(false)));
    }

    #[test]
    fn empty_program_is_null() {
        assert_eq!(run(""), Ok(Value::Null));
        assert_eq!(run(";;"), Ok(Value::Null));
    }

    #[test]
    fn evaluates_arithmetic() {
        assert_eq!(run("5 + 10;"), Ok(Value::Int(15)));
        assert_eq!(run("10 - 4;"), Ok(Value::Int(6)));
        assert_eq!(run("6 * 7;"), Ok(Value::Int(42)));
        assert_eq!(run("9 / 2;"), Ok(Value::Int(4)));
        assert_eq!(run("9 % 2;"), Ok(Value::Int(1)));
        assert_eq!(run("2 ** 10;"), Ok(Value::Int(1024)));
    }

    #[test]
    fn evaluates_float_arithmetic() {
        assert_eq!(run("1.5 + 2.25;"), Ok(Value::Float(3.75)));
        assert_eq!(run("5.0 - 1.5;"), Ok(Value::Float(3.5)));
        assert_eq!(run("2.0 * 2.5;"), Ok(Value::Float(5.0)));
        assert_eq!(run("5.0 / 2.0;"), Ok(Value::Float(2.5)));
        assert_eq!(run("5.5 % 2.0;"), Ok(Value::Int(1)));
        assert_eq!(run("1.5 ** 2.0;"), Ok(Value::Float(2.25)));
    }

    #[test]
    fn arithmetic_is_commutative() {
        for (a, b) in [(3, 4), (0, 9), (12, 12)] {
            assert_eq!(run(&format!("{a} + {b};")), run(&format!("{b} + {a};")));
            assert_eq!(run(&format!("{a} * {b};")), run(&format!("{b} * {a};")));
        }
    }

    #[test]
    fn arithmetic_requires_matching_types() {
        assert_eq!(
            run("1 + 1.0;"),
            Err(RuntimeError::new("cannot perform arithmetic on differing types"))
        );
    }

    #[test]
    fn arithmetic_requires_numeric_types() {
        assert_eq!(
            run("true + false;"),
            Err(RuntimeError::new("invalid operation for non-numeric types"))
        );
        assert_eq!(
            run("'a' + 'b';"),
            Err(RuntimeError::new("invalid operation for non-numeric types"))
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(run("1 / 0;"), Err(RuntimeError::new("division by zero")));
        assert_eq!(run("1 % 0;"), Err(RuntimeError::new("division by zero")));
    }

    #[test]
    fn evaluates_comparisons() {
        assert_eq!(run("1 < 2;"), Ok(Value::Bool(true)));
        assert_eq!(run("2.5 > 3.5;"), Ok(Value::Bool(false)));
        assert_eq!(run("5 == 5;"), Ok(Value::Bool(true)));
        assert_eq!(run("'a' != 'b';"), Ok(Value::Bool(true)));
        assert_eq!(run("true == true;"), Ok(Value::Bool(true)));
    }

    #[test]
    fn comparison_requires_matching_types() {
        assert_eq!(
            run("5 == 'a';"),
            Err(RuntimeError::new("cannot compare two values of differing types"))
        );
        assert_eq!(
            run("5 == 5.0;"),
            Err(RuntimeError::new("cannot compare two values of differing types"))
        );
    }

    #[test]
    fn ordering_requires_numeric_types() {
        assert_eq!(
            run("'a' < 'b';"),
            Err(RuntimeError::new(
                "cannot use the '<' operator on non-numeric values"
            ))
        );
        assert_eq!(
            run("true > false;"),
            Err(RuntimeError::new(
                "cannot use the '>' operator on non-numeric values"
            ))
        );
    }

    #[test]
    fn evaluates_logic() {
        assert_eq!(run("true && false;"), Ok(Value::Bool(false)));
        assert_eq!(run("true && true;"), Ok(Value::Bool(true)));
        assert_eq!(run("false || true;"), Ok(Value::Bool(true)));
        assert_eq!(run("false || false;"), Ok(Value::Bool(false)));
    }

    #[test]
    fn logic_requires_booleans() {
        assert_eq!(
            run("1 && 2;"),
            Err(RuntimeError::new("invalid operand types for logical operation"))
        );
    }

    #[test]
    fn variables() {
        assert_eq!(run("let int num = 12; num * 2;"), Ok(Value::Int(24)));
        assert_eq!(
            run("let int foo = 10; let int bar = 2; (foo * bar) == 20;"),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn assignment_yields_the_new_value() {
        assert_eq!(run("let int num = 1; num = 2;"), Ok(Value::Int(2)));
    }

    #[test]
    fn assignment_requires_matching_types() {
        assert_eq!(
            run("let int num = 1; num = 1.5;"),
            Err(RuntimeError::new(
                "cannot assign a variable to a value of a different type"
            ))
        );
        assert_eq!(
            run("let float num = 1;"),
            Err(RuntimeError::new(
                "cannot assign a variable to a value of a different type"
            ))
        );
    }

    #[test]
    fn declaration_without_initializer() {
        assert_eq!(run("let int num;"), Ok(Value::Null));
        assert_eq!(run("let int num; num = 5; num;"), Ok(Value::Int(5)));
    }

    #[test]
    fn uninitialized_read_fails() {
        assert_eq!(
            run("let int num; num;"),
            Err(RuntimeError::new("cannot evaluate an unitialized variable"))
        );
        assert_eq!(
            run("let int num; num + 1;"),
            Err(RuntimeError::new("cannot evaluate an unitialized variable"))
        );
    }

    #[test]
    fn unknown_symbol_fails() {
        assert_eq!(
            run("foo;"),
            Err(RuntimeError::new("unknown symbol 'foo'"))
        );
    }

    #[test]
    fn blocks_yield_their_last_statement() {
        assert_eq!(
            run("begin let char a = 'a'; let char b = 'b'; a != b; end"),
            Ok(Value::Bool(true))
        );
        assert_eq!(run("begin end"), Ok(Value::Null));
    }

    #[test]
    fn blocks_see_enclosing_scopes() {
        assert_eq!(
            run("let float tmp = 5.0; begin tmp == 5.0; end tmp;"),
            Ok(Value::Float(5.0))
        );
    }

    #[test]
    fn block_variables_stay_inside() {
        assert_eq!(
            run("begin let float tmp = 10.0; end tmp + 2.0;"),
            Err(RuntimeError::new("unknown symbol 'tmp'"))
        );
    }

    #[test]
    fn conditionals() {
        assert_eq!(
            run("let int node = 5; if (true) node = 20; end node;"),
            Ok(Value::Int(20))
        );
        assert_eq!(
            run("let int five = 5; if (false) five = 20; end five;"),
            Ok(Value::Int(5))
        );
    }

    #[test]
    fn skipped_conditional_is_null() {
        assert_eq!(run("if (false) 5; end"), Ok(Value::Null));
    }

    #[test]
    fn else_branches() {
        assert_eq!(
            run("let int num = 0; if (false) num = 1; else num = 2; end num;"),
            Ok(Value::Int(2))
        );
        assert_eq!(
            run("let int num = 0; if (true) num = 1; else num = 2; end num;"),
            Ok(Value::Int(1))
        );
    }

    #[test]
    fn non_boolean_condition_fails() {
        assert_eq!(
            run("if (5) 1; end"),
            Err(RuntimeError::new("invalid conditional"))
        );
        assert_eq!(
            run("while (5) 1; end"),
            Err(RuntimeError::new("invalid conditional"))
        );
    }

    #[test]
    fn loops() {
        assert_eq!(
            run("let int ctr = 0; while (ctr != 10) ctr = (ctr + 1); end ctr;"),
            Ok(Value::Int(10))
        );
    }

    #[test]
    fn loop_yields_the_last_iteration() {
        assert_eq!(
            run("let int ctr = 0; while (ctr != 3) ctr = (ctr + 1); end"),
            Ok(Value::Int(3))
        );
    }

    #[test]
    fn unentered_loop_is_null() {
        assert_eq!(
            run("let int touched = 0; while (false) touched = 1; end"),
            Ok(Value::Null)
        );
        assert_eq!(
            run("let int touched = 0; while (false) touched = 1; end touched;"),
            Ok(Value::Int(0))
        );
    }

    #[test]
    fn print_writes_arguments_in_source_order() {
        assert_eq!(run_for_output("print 1 ' ' 2;"), "1 2");
        assert_eq!(run_for_output("println 'a' 'b';"), "ab\n");
        assert_eq!(run_for_output("println;"), "\n");
    }

    #[test]
    fn print_yields_null() {
        assert_eq!(run("print 5;"), Ok(Value::Null));
    }

    #[test]
    fn fibonacci() {
        let source = "
            let int count = 0;
            let int first = 0;
            let int second = 1;
            let int next = 0;
            while (count != 19)
                next = (first + second);
                first = second;
                second = next;
                count = (count + 1);
            end
            second;
        ";
        assert_eq!(run(source), Ok(Value::Int(6765)));
    }
}
