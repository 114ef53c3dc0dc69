use chrono::{DateTime, Utc};
use mockall::mock;
use purity_engine::{
    db_types::{IdentityClaims, NewOrder, NewUser, Order, PaymentApplication, PaymentResult, TokenPurpose, User},
    traits::{
        GatewayCredentials,
        GatewayError,
        OrderManagement,
        OrderStoreError,
        PaymentGateway,
        RemoteOrder,
        RemoteOrderRequest,
        UserManagement,
        UserStoreError,
    },
};

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_gateway_ref(&self, gateway_order_id: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError>;
        async fn cancel_order(&self, id: i64, user_id: i64) -> Result<bool, OrderStoreError>;
        async fn apply_payment_result(&self, result: PaymentResult) -> Result<PaymentApplication, OrderStoreError>;
    }
}

mock! {
    pub UserManager {}
    impl UserManagement for UserManager {
        async fn create_user(&self, user: NewUser) -> Result<User, UserStoreError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;
        async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserStoreError>;
        async fn upsert_external_identity(&self, claims: &IdentityClaims) -> Result<User, UserStoreError>;
        async fn mark_email_verified(&self, user_id: i64) -> Result<(), UserStoreError>;
        async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), UserStoreError>;
        async fn insert_account_token(
            &self,
            user_id: i64,
            purpose: TokenPurpose,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), UserStoreError>;
        async fn consume_account_token(&self, purpose: TokenPurpose, token: &str) -> Result<Option<i64>, UserStoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        fn credentials(&self) -> &GatewayCredentials;
        async fn create_remote_order(&self, request: RemoteOrderRequest) -> Result<RemoteOrder, GatewayError>;
    }
}
