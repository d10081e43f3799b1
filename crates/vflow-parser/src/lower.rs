use crate::{parse, ParseError, ParseResult, Rule};
use pest::iterators::Pair;
use std::collections::HashMap;
use vflow_core::builder::{FunctionBuilder, ModuleBuilder};
use vflow_core::instructions::InstKind;
use vflow_core::values::{ObjectId, TypeTag, ValueId};
use vflow_core::{BlockId, Module};

/// Parses text IR into a [`Module`].
///
/// Deliberately lenient about operands: a value name that is never defined
/// still lowers (to a value with no definition), because dangling-operand
/// detection is the value-flow builder's per-function concern, not a parse
/// error that would reject the whole file.
pub fn parse_module(input: &str) -> ParseResult<Module> {
    let mut builder = ModuleBuilder::new();

    for pair in parse(input)? {
        if pair.as_rule() == Rule::module {
            for item in pair.into_inner() {
                if item.as_rule() == Rule::function {
                    lower_function(&mut builder, item)?;
                }
            }
        }
    }

    Ok(builder.finish())
}

struct LowerCtx {
    function: String,
    values: HashMap<String, ValueId>,
    objects: HashMap<String, ObjectId>,
    blocks: HashMap<String, BlockId>,
}

fn lower_function(builder: &mut ModuleBuilder, pair: Pair<'_, Rule>) -> ParseResult<()> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .expect("function has a name")
        .as_str()
        .trim_start_matches('%')
        .to_string();

    let mut fb = builder.function(&name);
    let mut ctx = LowerCtx {
        function: name,
        values: HashMap::new(),
        objects: HashMap::new(),
        blocks: HashMap::new(),
    };

    let mut block_pairs = Vec::new();
    for item in inner {
        match item.as_rule() {
            Rule::param_list => {
                for param in item.into_inner() {
                    let mut parts = param.into_inner();
                    let value_name = parts.next().expect("param value").as_str().to_string();
                    let ty = lower_type(&parts.next().expect("param type"));
                    let value = fb.param(ty);
                    ctx.values.insert(value_name, value);
                }
            }
            Rule::object_decl => {
                let object_name = item
                    .into_inner()
                    .next()
                    .expect("object name")
                    .as_str()
                    .trim_start_matches('@')
                    .to_string();
                let id = fb.object(&object_name);
                ctx.objects.insert(object_name, id);
            }
            Rule::block => block_pairs.push(item),
            _ => {}
        }
    }

    // Jumps may target blocks that appear later in the text, so labels are
    // resolved in a pre-pass. The first label is the entry block.
    for (index, block_pair) in block_pairs.iter().enumerate() {
        let label = block_pair
            .clone()
            .into_inner()
            .next()
            .expect("block label")
            .as_str()
            .to_string();
        let id = if index == 0 {
            fb.current_block()
        } else {
            fb.create_block()
        };
        if ctx.blocks.insert(label.clone(), id).is_some() {
            return Err(ParseError::DuplicateBlock {
                function: ctx.function.clone(),
                block: label,
            });
        }
    }

    for block_pair in block_pairs {
        lower_block(&mut fb, &mut ctx, block_pair)?;
    }

    fb.finish();
    Ok(())
}

fn lower_block(
    fb: &mut FunctionBuilder<'_>,
    ctx: &mut LowerCtx,
    pair: Pair<'_, Rule>,
) -> ParseResult<()> {
    let mut inner = pair.into_inner();
    let label = inner.next().expect("block label").as_str();
    let block_id = ctx.blocks[label];
    fb.switch_to_block(block_id).expect("block was pre-created");

    for item in inner {
        match item.as_rule() {
            Rule::instruction => lower_instruction(fb, ctx, item)?,
            Rule::terminator => lower_terminator(fb, ctx, item)?,
            _ => {}
        }
    }
    Ok(())
}

fn lower_instruction(
    fb: &mut FunctionBuilder<'_>,
    ctx: &mut LowerCtx,
    pair: Pair<'_, Rule>,
) -> ParseResult<()> {
    let inner = pair.into_inner().next().expect("instruction body");
    match inner.as_rule() {
        Rule::store_inst => {
            let mut parts = inner.into_inner();
            let pointer = operand(fb, ctx, &parts.next().expect("store pointer"));
            let value = operand(fb, ctx, &parts.next().expect("store value"));
            fb.push(InstKind::Store { pointer, value });
        }
        Rule::bare_call => {
            let (callee, args) = lower_call_parts(fb, ctx, inner);
            fb.push(InstKind::Call {
                result: None,
                callee,
                args,
            });
        }
        Rule::def_inst => {
            let mut parts = inner.into_inner();
            let result_name = parts.next().expect("result value").as_str().to_string();
            let rhs = parts
                .next()
                .expect("instruction rhs")
                .into_inner()
                .next()
                .expect("rhs body");
            let annot = parts
                .next()
                .map(|p| lower_type(&p.into_inner().next().expect("annotated type")));

            match rhs.as_rule() {
                Rule::assign_rhs => {
                    let source = rhs.into_inner().next().expect("assign operand");
                    let operand_id = operand(fb, ctx, &source);
                    let ty = annot
                        .or_else(|| fb.value_type(operand_id))
                        .unwrap_or(TypeTag::Scalar);
                    let result = define(fb, ctx, &result_name, ty);
                    fb.push(InstKind::Assign {
                        result,
                        operand: operand_id,
                    });
                }
                Rule::addr_rhs => {
                    let object_name = rhs
                        .into_inner()
                        .next()
                        .expect("addr_of object")
                        .as_str()
                        .trim_start_matches('@')
                        .to_string();
                    let object = *ctx.objects.get(&object_name).ok_or_else(|| {
                        ParseError::UnknownObject {
                            function: ctx.function.clone(),
                            object: object_name.clone(),
                        }
                    })?;
                    // addr_of always produces an address, annotation or not
                    let result = define(fb, ctx, &result_name, TypeTag::Pointer);
                    fb.push(InstKind::AddrOf { result, object });
                }
                Rule::load_rhs => {
                    let source = rhs.into_inner().next().expect("load pointer");
                    let pointer = operand(fb, ctx, &source);
                    let result = define(fb, ctx, &result_name, annot.unwrap_or(TypeTag::Scalar));
                    fb.push(InstKind::Load { result, pointer });
                }
                Rule::call_rhs => {
                    let (callee, args) = lower_call_parts(fb, ctx, rhs);
                    let result = define(fb, ctx, &result_name, annot.unwrap_or(TypeTag::Scalar));
                    fb.push(InstKind::Call {
                        result: Some(result),
                        callee,
                        args,
                    });
                }
                _ => unreachable!("grammar admits no other rhs"),
            }
        }
        _ => unreachable!("grammar admits no other instruction"),
    }
    Ok(())
}

fn lower_terminator(
    fb: &mut FunctionBuilder<'_>,
    ctx: &mut LowerCtx,
    pair: Pair<'_, Rule>,
) -> ParseResult<()> {
    let inner = pair.into_inner().next().expect("terminator body");
    match inner.as_rule() {
        Rule::jump_term => {
            let label = inner.into_inner().next().expect("jump target").as_str();
            let target = resolve_block(ctx, label)?;
            fb.jump(target);
        }
        Rule::branch_term => {
            let mut parts = inner.into_inner();
            let condition = operand(fb, ctx, &parts.next().expect("branch condition"));
            let then_label = parts.next().expect("then target").as_str();
            let else_label = parts.next().expect("else target").as_str();
            let then_block = resolve_block(ctx, then_label)?;
            let else_block = resolve_block(ctx, else_label)?;
            fb.branch(condition, then_block, else_block);
        }
        Rule::return_term => {
            let value = inner.into_inner().next().map(|p| operand(fb, ctx, &p));
            fb.ret(value);
        }
        _ => unreachable!("grammar admits no other terminator"),
    }
    Ok(())
}

fn lower_call_parts(
    fb: &mut FunctionBuilder<'_>,
    ctx: &mut LowerCtx,
    pair: Pair<'_, Rule>,
) -> (String, Vec<ValueId>) {
    let mut inner = pair.into_inner();
    let callee = inner
        .next()
        .expect("callee name")
        .as_str()
        .trim_start_matches('%')
        .to_string();
    let args = inner
        .next()
        .map(|list| {
            list.into_inner()
                .map(|arg| operand(fb, ctx, &arg))
                .collect()
        })
        .unwrap_or_default();
    (callee, args)
}

fn operand(fb: &mut FunctionBuilder<'_>, ctx: &mut LowerCtx, pair: &Pair<'_, Rule>) -> ValueId {
    let name = pair.as_str();
    match ctx.values.get(name) {
        Some(&value) => value,
        None => {
            let value = fb.alloc_value(TypeTag::Scalar);
            ctx.values.insert(name.to_string(), value);
            value
        }
    }
}

fn define(
    fb: &mut FunctionBuilder<'_>,
    ctx: &mut LowerCtx,
    name: &str,
    ty: TypeTag,
) -> ValueId {
    match ctx.values.get(name) {
        Some(&value) => {
            fb.set_value_type(value, ty);
            value
        }
        None => {
            let value = fb.alloc_value(ty);
            ctx.values.insert(name.to_string(), value);
            value
        }
    }
}

fn resolve_block(ctx: &LowerCtx, label: &str) -> ParseResult<BlockId> {
    ctx.blocks
        .get(label)
        .copied()
        .ok_or_else(|| ParseError::UnknownBlock {
            function: ctx.function.clone(),
            block: label.to_string(),
        })
}

fn lower_type(pair: &Pair<'_, Rule>) -> TypeTag {
    match pair.as_str() {
        "ptr" => TypeTag::Pointer,
        _ => TypeTag::Scalar,
    }
}
