use ballast_shared::ComponentState;

/// Combines a client's claimed component state with the authoritative one.
/// Clients only control the settings a player can touch; simulated readings
/// always come from `truth`. Returns `None` when the kinds differ.
pub fn merge_component_claim(
    truth: &ComponentState,
    claim: ComponentState,
) -> Option<ComponentState> {
    let merged = match (truth, claim) {
        (ComponentState::Reactor(truth), ComponentState::Reactor(claim)) => {
            let mut merged = *truth;
            merged.auto_temperature = claim.auto_temperature;
            merged.power_on = claim.power_on;
            merged.target_fission_rate = claim.target_fission_rate;
            merged.target_turbine_output = claim.target_turbine_output;
            ComponentState::Reactor(merged)
        }
        (ComponentState::PowerDistributor(_), claim @ ComponentState::PowerDistributor(_)) => claim,
        (ComponentState::Steering(_), claim @ ComponentState::Steering(_)) => claim,
        _ => return None,
    };
    Some(merged.quantized())
}
