// Copyright (c) 2025 Rajan Panneer Selvam
//
// Licensed under the Business Source License 1.1 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.mariadb.com/bsl11
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


mod claim_selection_tests;
mod claim_validation_tests;
mod condition_tests;
mod config_view_tests;
mod credentials_tests;
mod error_classification_tests;
mod fixtures;
mod pool_tests;
mod requeue_policy_tests;
mod serialization_tests;
