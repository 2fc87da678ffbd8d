use cosmwasm_std::{Response, StdError, StdResult, Storage};
use cw_storage_plus::Item;

/// Per-contract counter behind every audit reference.
const AUDIT_SEQ: Item<u64> = Item::new("audit_seq");

/// Allocate the next audit reference, formatted `"{contract}:{action}:{seq}"`.
pub fn next_audit_ref(
    storage: &mut dyn Storage,
    contract: &str,
    action: &str,
) -> StdResult<String> {
    let seq = AUDIT_SEQ
        .may_load(storage)?
        .unwrap_or_default()
        .checked_add(1)
        .ok_or_else(|| StdError::generic_err("audit sequence overflow"))?;
    AUDIT_SEQ.save(storage, &seq)?;
    Ok(format!("{}:{}:{}", contract, action, seq))
}

/// Start a response for a state-changing handler: `action` and `audit_ref`
/// are always the first two attributes.
pub fn audited_response(
    storage: &mut dyn Storage,
    contract: &str,
    action: &str,
) -> StdResult<Response> {
    let audit_ref = next_audit_ref(storage, contract, action)?;
    Ok(Response::new()
        .add_attribute("action", action)
        .add_attribute("audit_ref", audit_ref))
}
