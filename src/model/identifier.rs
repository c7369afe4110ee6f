//! Identifier Strategy Resolver
//!
//! Decides, per object type, how identifiers are obtained. An explicit
//! strategy in the descriptor wins; otherwise identifier constraints pick
//! one (enumerated or named-only identifiers must be supplied, blank-only
//! identifiers are minted blank) and the configured default applies last.

use tracing::debug;

use super::{IdentifierKind, IdentifierSpec, IdentityStrategy, ModelError};
use crate::config::GeneratorConfig;
use crate::descriptor::IdentifierDescriptor;

/// Resolve and check the identifier of `type_name`
pub fn resolve_identifier(
    type_name: &str,
    descriptor: &IdentifierDescriptor,
    config: &GeneratorConfig,
) -> Result<IdentifierSpec, ModelError> {
    let strategy = match descriptor.strategy {
        Some(strategy) => strategy,
        None if !descriptor.allowed.is_empty() => IdentityStrategy::ExplicitOnly,
        None => match (descriptor.kind, config.identifier_strategy) {
            (IdentifierKind::Blank, _) => IdentityStrategy::BlankDefault,
            (IdentifierKind::Named, IdentityStrategy::BlankDefault) => IdentityStrategy::ExplicitOnly,
            (_, configured) => configured,
        },
    };

    let namespace = descriptor
        .namespace
        .clone()
        .or_else(|| config.mint_namespace.clone());

    let spec = IdentifierSpec {
        kind: descriptor.kind,
        allowed: descriptor.allowed.clone(),
        strategy,
        namespace: if strategy.needs_namespace() { namespace } else { None },
    };
    check_identifier(type_name, &spec)?;

    debug!(type_name, strategy = strategy.as_str(), rust_type = spec.rust_type(), "resolved identifier");
    Ok(spec)
}

/// Reject strategy and constraint combinations no identifier can satisfy
pub fn check_identifier(type_name: &str, spec: &IdentifierSpec) -> Result<(), ModelError> {
    let conflict = |reason: &str| ModelError::IdentifierStrategyConflict {
        type_name: type_name.to_string(),
        reason: reason.to_string(),
    };

    match (spec.kind, spec.strategy) {
        (IdentifierKind::Blank, IdentityStrategy::ExplicitOnly) => {
            return Err(conflict("explicit identifiers cannot be blank nodes"))
        }
        (IdentifierKind::Blank, IdentityStrategy::RandomMint | IdentityStrategy::ContentHashMint) => {
            return Err(conflict("minted IRIs cannot satisfy a blank-only identifier"))
        }
        (IdentifierKind::Named, IdentityStrategy::BlankDefault) => {
            return Err(conflict("blank identifiers cannot satisfy a named-only identifier"))
        }
        _ => {}
    }

    if !spec.allowed.is_empty() {
        if spec.kind == IdentifierKind::Blank {
            return Err(conflict("enumerated identifiers are IRIs"));
        }
        if spec.strategy != IdentityStrategy::ExplicitOnly {
            return Err(conflict("enumerated identifiers must be supplied explicitly"));
        }
    }

    if spec.strategy.needs_namespace() && spec.namespace.as_deref().map(str::is_empty).unwrap_or(true) {
        return Err(ModelError::MissingIdentifierInput {
            type_name: type_name.to_string(),
            strategy: spec.strategy.as_str().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: IdentifierKind, strategy: Option<IdentityStrategy>) -> IdentifierDescriptor {
        IdentifierDescriptor {
            kind,
            strategy,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_follow_constraints() {
        let config = GeneratorConfig::default();

        let any = resolve_identifier("T", &descriptor(IdentifierKind::Any, None), &config).unwrap();
        assert_eq!(any.strategy, IdentityStrategy::BlankDefault);
        assert_eq!(any.rust_type(), "Identifier");

        let named = resolve_identifier("T", &descriptor(IdentifierKind::Named, None), &config).unwrap();
        assert_eq!(named.strategy, IdentityStrategy::ExplicitOnly);

        let enumerated = IdentifierDescriptor {
            allowed: vec!["http://example.com/a".to_string()],
            ..Default::default()
        };
        let enumerated = resolve_identifier("T", &enumerated, &config).unwrap();
        assert_eq!(enumerated.strategy, IdentityStrategy::ExplicitOnly);
        assert_eq!(enumerated.rust_type(), "NamedNode");
    }

    #[test]
    fn test_namespace_from_config() {
        let mut config = GeneratorConfig::default();
        let random = descriptor(IdentifierKind::Any, Some(IdentityStrategy::RandomMint));
        assert!(matches!(
            resolve_identifier("T", &random, &config),
            Err(ModelError::MissingIdentifierInput { .. })
        ));

        config.mint_namespace = Some("urn:example:".to_string());
        let spec = resolve_identifier("T", &random, &config).unwrap();
        assert_eq!(spec.namespace.as_deref(), Some("urn:example:"));
    }

    #[test]
    fn test_conflicts() {
        let config = GeneratorConfig::default();
        for (kind, strategy) in [
            (IdentifierKind::Blank, IdentityStrategy::ExplicitOnly),
            (IdentifierKind::Blank, IdentityStrategy::ContentHashMint),
            (IdentifierKind::Named, IdentityStrategy::BlankDefault),
        ] {
            let result = resolve_identifier("T", &descriptor(kind, Some(strategy)), &config);
            assert!(
                matches!(result, Err(ModelError::IdentifierStrategyConflict { .. })),
                "{:?} + {:?} should conflict",
                kind,
                strategy
            );
        }

        let minted_enumeration = IdentifierDescriptor {
            allowed: vec!["http://example.com/a".to_string()],
            strategy: Some(IdentityStrategy::BlankDefault),
            ..Default::default()
        };
        assert!(resolve_identifier("T", &minted_enumeration, &config).is_err());
    }
}
