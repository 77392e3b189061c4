//! Recursive per-container mutators.
//!
//! Every container goes through [`mutate_container`]: roll a mutation kind
//! with the container's weights, hand structural kinds to
//! [`super::structural`], otherwise pick a field, synthesize it when absent,
//! mutate it (recursing into sub-containers) and rebuild the container with
//! only that occurrence replaced.

use log::debug;
use rand::Rng;

use crate::{
    error::MutatorError,
    inputstruct::{
        grammar::{ContainerKind, FieldClass, Grammar, KindWeights, LengthRule, MutationKind},
        ndn_tlv::{APPLICATION_PARAMETERS, KEY_DIGEST, NAME},
        tlv::Element,
    },
};

use super::{
    context::MutationCtx,
    digest::recompute_digest,
    scalar::mutate_scalar,
    selector::{choose_field, FieldChoice},
    structural,
};

/// Value a KeyLocator's Name is turned into on conversion.
const KEY_DIGEST_MARKER: [u8; 3] = [1, 1, 1];

/// Entry point for a whole Interest or Data packet.
pub fn mutate_packet(
    ctx: &mut MutationCtx<'_>,
    kind: ContainerKind,
    packet: &Element,
) -> Result<Element, MutatorError> {
    let grammar = kind.grammar();
    let weights = if ctx.config.packet_structural {
        KindWeights::UNIFORM
    } else {
        grammar.weights
    };
    dispatch(ctx, grammar, packet, weights)
}

pub fn mutate_container(
    ctx: &mut MutationCtx<'_>,
    kind: ContainerKind,
    container: &Element,
) -> Result<Element, MutatorError> {
    if kind == ContainerKind::KeyLocator {
        return key_locator(ctx, container);
    }
    let grammar = kind.grammar();
    dispatch(ctx, grammar, container, grammar.weights)
}

fn dispatch(
    ctx: &mut MutationCtx<'_>,
    grammar: &Grammar,
    container: &Element,
    weights: KindWeights,
) -> Result<Element, MutatorError> {
    let kind = weights.draw(&mut ctx.rng);
    debug!("{:?}: {:?}", grammar.kind, kind);
    Ok(match kind {
        MutationKind::Delete => structural::delete(ctx, grammar, container),
        MutationKind::Duplicate => structural::duplicate(ctx, grammar, container),
        MutationKind::Shuffle => structural::shuffle(ctx, grammar, container),
        MutationKind::Retag => structural::retag(ctx, grammar, container),
        MutationKind::Field => return mutate_field(ctx, grammar, container),
    })
}

fn mutate_field(
    ctx: &mut MutationCtx<'_>,
    grammar: &Grammar,
    container: &Element,
) -> Result<Element, MutatorError> {
    let (working, index) = match choose_field(ctx, grammar, container) {
        FieldChoice::Existing(index) => (container.clone(), index),
        FieldChoice::Missing(tag) => {
            let index = grammar.insertion_point(container, tag);
            debug!("{:?}: synthesizing {} at {}", grammar.kind, tag, index);
            (container.insert_child(index, &grammar.synthesize(tag)), index)
        }
        FieldChoice::Nothing => return Ok(container.clone()),
    };
    let Some(target) = working.children().get(index) else {
        return Ok(container.clone());
    };

    let replacement = match grammar.class_of(target.tag()) {
        FieldClass::Container(kind) => Some(mutate_container(ctx, kind, target)?),
        FieldClass::Scalar(rule) => Some(target.with_value(mutate_scalar(ctx, rule, target.value())?)),
        FieldClass::Parameters => application_parameters(ctx, target)?,
        FieldClass::PassThrough => Some(target.clone()),
    };
    let params_touched = target.tag() == APPLICATION_PARAMETERS
        && grammar.class_of(APPLICATION_PARAMETERS) == FieldClass::Parameters;

    let children = working.children();
    let mut rebuilt = grammar.rebuild(children.iter().enumerate().filter_map(|(i, c)| {
        if i == index {
            replacement.as_ref()
        } else {
            Some(c)
        }
    }));
    if params_touched {
        rebuilt = sync_parameters_digest(ctx, grammar, &rebuilt)?;
    }

    if !ctx.budget.fits(container.encoded_len(), rebuilt.encoded_len()) {
        debug!("{:?}: field mutation exceeds the budget", grammar.kind);
        return Ok(container.clone());
    }
    Ok(rebuilt)
}

/// Removal or byte mutation. A parameters element carrying TLV children has
/// one of them mutated; an opaque one is mutated as a whole.
fn application_parameters(
    ctx: &mut MutationCtx<'_>,
    params: &Element,
) -> Result<Option<Element>, MutatorError> {
    if ctx.rng.gen_bool(0.5) {
        debug!("ApplicationParameters: removed");
        return Ok(None);
    }
    let children = params.children();
    if children.is_empty() {
        let value = mutate_scalar(ctx, LengthRule::Bytes, params.value())?;
        return Ok(Some(params.with_value(value)));
    }
    let index = ctx.rng.gen_range(0..children.len());
    let field = &children[index];
    let mutated = field.with_value(mutate_scalar(ctx, LengthRule::Bytes, field.value())?);
    Ok(Some(params.replace_child(index, Some(&mutated))))
}

/// Rewrites the Name's parameters digest after ApplicationParameters changed.
fn sync_parameters_digest(
    ctx: &MutationCtx<'_>,
    grammar: &Grammar,
    packet: &Element,
) -> Result<Element, MutatorError> {
    let Some(name_index) = packet.find(NAME) else {
        return Ok(packet.clone());
    };
    let params = packet.find(APPLICATION_PARAMETERS).map(|i| &packet.children()[i]);
    let name = recompute_digest(&packet.children()[name_index], params, ctx.digest)?;
    Ok(grammar.rebuild(
        packet
            .children()
            .iter()
            .enumerate()
            .map(|(i, c)| if i == name_index { &name } else { c }),
    ))
}

/// KeyLocator is field-only: a Name is mutated recursively and then, on a
/// coin flip, replaced by a KeyDigest; anything else is mutated as bytes.
fn key_locator(ctx: &mut MutationCtx<'_>, locator: &Element) -> Result<Element, MutatorError> {
    let Some(inner) = locator.children().first() else {
        debug!("KeyLocator: empty, nothing to mutate");
        return Ok(locator.clone());
    };
    let replacement = if inner.tag() == NAME {
        let name = mutate_container(ctx, ContainerKind::Name, inner)?;
        if ctx.rng.gen_bool(0.5) {
            Element::new(KEY_DIGEST, KEY_DIGEST_MARKER.to_vec())
        } else {
            name
        }
    } else {
        inner.with_value(mutate_scalar(ctx, LengthRule::Bytes, inner.value())?)
    };
    let rebuilt = locator.replace_child(0, Some(&replacement));
    if !ctx.budget.fits(locator.encoded_len(), rebuilt.encoded_len()) {
        debug!("KeyLocator: mutation exceeds the budget");
        return Ok(locator.clone());
    }
    Ok(rebuilt)
}
