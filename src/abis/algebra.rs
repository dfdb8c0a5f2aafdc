use alloy::sol;

sol! {
    event Pool(address indexed token0, address indexed token1, address pool);
    event Fee(uint16 fee);
    event TickSpacing(int24 newTickSpacing);
    event Plugin(address newPluginAddress);
    event PluginConfig(uint8 newPluginConfig);
}
