//! Solidity ABI of the contracts the controller calls into.
//!
//! Only the selectors and argument layouts matter here; the controller encodes calls with
//! `SolCall::abi_encode` and decodes returns with `SolCall::abi_decode_returns`.

use stylus_sdk::alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Stargate router: value leg + payload, delivered to `sgReceive` on the destination.
    interface IStargateRouter {
        struct LzTxParams {
            uint256 dstGasForCall;
            uint256 dstNativeAmount;
            bytes dstNativeAddr;
        }

        function swap(
            uint16 dstChainId,
            uint256 srcPoolId,
            uint256 dstPoolId,
            address refundAddress,
            uint256 amountLD,
            uint256 minAmountLD,
            LzTxParams lzTxParams,
            bytes to,
            bytes payload
        ) external payable;

        function quoteLayerZeroFee(
            uint16 dstChainId,
            uint8 functionType,
            bytes toAddress,
            bytes transferAndCallPayload,
            LzTxParams lzTxParams
        ) external view returns (uint256, uint256);
    }

    /// Receive callback the router invokes on the destination controller.
    interface IStargateReceiver {
        function sgReceive(
            uint16 srcChainId,
            bytes srcAddress,
            uint256 nonce,
            address token,
            uint256 amountLD,
            bytes payload
        ) external;
    }

    /// Vault collaborator: credit on behalf of a recipient, or redeem shares held by the caller.
    interface IXChainVault {
        function creditDeposit(
            uint256 amount,
            uint256 slippageFactor,
            address recipient,
            bytes data
        ) external returns (uint256);
        function debitForWithdrawal(uint256 shareAmount, address recipient)
            external
            returns (uint256);
    }

    /// Chainlink AggregatorV3.
    interface IPriceFeed {
        function decimals() external view returns (uint8);
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }
}
